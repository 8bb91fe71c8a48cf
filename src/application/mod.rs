pub mod health;
pub mod loan;
