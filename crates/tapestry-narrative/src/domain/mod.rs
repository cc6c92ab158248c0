//! Pure narrative rules.

pub mod continuation;
pub mod defects;
pub mod mutate;
pub mod path;
pub mod resolve;
