pub use analytics::{ProviderDailyStats, provider_earnings};
pub use bookings::{Booking, BookingStatus, CancelledBy};
pub use commands::{
    CreateBookingCmd, PayBillCmd, RescheduleBookingCmd, SendCmd, TopUpCmd, TopUpMethod,
    WithdrawCmd,
};
pub use currency::Currency;
pub use error::EngineError;
pub use gateway::{GatewayError, PaymentGateway, SandboxGateway};
pub use loyalty::{COMPLETION_POINTS, LoyaltyAccount, MINOR_UNITS_PER_POINT, Tier};
pub use notifications::{Notification, NotificationEvent, Notifier};
pub use ops::{BookingView, Engine, EngineBuilder};
pub use services::Service;
pub use wallet_transactions::{TransactionKind, TransactionStatus, WalletTransaction};
pub use wallets::Wallet;

mod analytics;
mod bookings;
mod commands;
mod currency;
mod error;
mod gateway;
mod loyalty;
mod notifications;
mod ops;
mod services;
pub mod users;
mod wallet_transactions;
mod wallets;

type ResultEngine<T> = Result<T, EngineError>;
