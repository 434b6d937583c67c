use clap::Args;
use std::time::Duration;

/// Payment provider settings. Every field can come from the environment.
#[derive(Args, Debug, Clone)]
pub struct GatewayConfig {
    /// ISO currency code used for every order
    #[arg(long, env = "EVSETTLE_CURRENCY", default_value = "INR")]
    pub currency: String,

    /// Provider key id, also handed to clients for checkout
    #[arg(long, env = "RAZORPAY_KEY_ID", default_value = "")]
    pub key_id: String,

    /// Provider key secret; signs payment callbacks
    #[arg(long, env = "RAZORPAY_KEY_SECRET", default_value = "", hide_env_values = true)]
    pub key_secret: String,

    /// Provider API base URL
    #[arg(long, env = "RAZORPAY_API_URL", default_value = "https://api.razorpay.com")]
    pub provider_url: String,

    /// Upper bound on each provider round trip, in seconds
    #[arg(long, env = "EVSETTLE_PROVIDER_TIMEOUT_SECS", default_value_t = 15)]
    pub provider_timeout_secs: u64,
}

impl GatewayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs.max(1))
    }
}
