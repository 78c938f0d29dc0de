pub mod sir_mix;
pub mod trajectory;
