pub mod accrual;
pub mod postgres;
