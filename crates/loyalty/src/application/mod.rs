pub mod config;
pub mod login;
pub mod reconcile;
pub mod register;
pub mod statements;
pub mod upload_order;
pub mod withdraw;

pub use config::ReconcileConfig;
pub use login::{LoginInput, LoginUseCase};
pub use reconcile::Reconciler;
pub use register::{RegisterInput, RegisterUseCase};
pub use statements::StatementsUseCase;
pub use upload_order::{UploadOrderUseCase, UploadOutcome};
pub use withdraw::{WithdrawInput, WithdrawUseCase};
