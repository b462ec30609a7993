pub mod http;
pub mod mail;
pub mod monobank;
pub mod privatbank;

pub use mail::{DryRunNotifier, SmtpNotifier};
pub use monobank::MonobankSource;
pub use privatbank::PrivatBankSource;
