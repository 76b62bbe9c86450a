//! Alert dispatch.
//!
//! [`Notifier`] is what the cycle calls with the triggered offers. The shipped
//! implementation renders an [`AlertMail`] and hands it to a [`MailTransport`];
//! [`HttpMailRelay`] is the transport used in production.

mod mail;
mod relay;

use std::future::Future;
use std::pin::Pin;

use pricewatch_core::BestOffer;

use crate::error::NotifyError;

pub use mail::{AlertMail, MailNotifier, MailTransport};
pub use relay::HttpMailRelay;

/// Boxed future returned by [`Notifier::notify`] and [`MailTransport::send`].
pub type NotifyFuture<'a> = Pin<Box<dyn Future<Output = Result<(), NotifyError>> + Send + 'a>>;

/// Sends one alert covering every triggered offer.
///
/// `Ok(())` means the alert left this process; callers persist alert state
/// only after that. Any failure must surface as an error.
pub trait Notifier: Send + Sync {
    fn notify<'a>(&'a self, offers: &'a [BestOffer]) -> NotifyFuture<'a>;
}
