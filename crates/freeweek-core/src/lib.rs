pub mod freetime;
pub mod identity;
