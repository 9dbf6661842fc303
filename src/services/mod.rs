pub mod mailer;
pub mod payments;
pub mod storage;

pub use mailer::Mailer;
pub use payments::PagoService;
pub use storage::StorageService;
