use super::client::ClientSlot;

#[cfg(feature = "sntp")]
pub use enabled::SntpClient;

/// The production client slot: rsntp when compiled in, otherwise the reason it isn't.
pub fn default_client(timeout: std::time::Duration) -> ClientSlot {
    #[cfg(feature = "sntp")]
    {
        Ok(std::sync::Arc::new(SntpClient::new(timeout)))
    }

    #[cfg(not(feature = "sntp"))]
    {
        let _ = timeout;
        Err("built without the `sntp` feature, no NTP client is available".to_string())
    }
}

#[cfg(feature = "sntp")]
mod enabled {
    use crate::clock::client::{NtpClient, QueryError, TimeSample};
    use futures::future::{BoxFuture, FutureExt};
    use rsntp::{AsyncSntpClient, Config};
    use std::time::Duration;
    use tracing::debug;

    // rsntp has its own receive timeout; keep it past ours so the caller's
    // deadline is the one that fires.
    const SOCKET_GRACE: Duration = Duration::from_secs(1);

    #[derive(Clone, Debug)]
    pub struct SntpClient {
        socket_timeout: Duration,
    }

    impl SntpClient {
        pub fn new(timeout: Duration) -> Self {
            Self {
                socket_timeout: timeout + SOCKET_GRACE,
            }
        }
    }

    impl NtpClient for SntpClient {
        fn query(
            &self,
            server: String,
            port: u16,
        ) -> BoxFuture<'static, Result<TimeSample, QueryError>> {
            let socket_timeout = self.socket_timeout;

            async move {
                let address = tokio::net::lookup_host((server.as_str(), port))
                    .await
                    .map_err(|e| QueryError::Resolve {
                        server: server.clone(),
                        reason: e.to_string(),
                    })?
                    .next()
                    .ok_or_else(|| QueryError::Resolve {
                        server: server.clone(),
                        reason: "no addresses found".to_string(),
                    })?;

                let client = AsyncSntpClient::with_config(Config::default().timeout(socket_timeout));
                let result = client
                    .synchronize(address)
                    .await
                    .map_err(|e| QueryError::Transport(e.to_string()))?;

                let date = match result.datetime().into_chrono_datetime() {
                    Ok(date) => Some(date),
                    Err(e) => {
                        debug!(%server, "NTP timestamp is not representable: {e}");
                        None
                    },
                };

                Ok(TimeSample {
                    date,
                    offset_millis: Some(result.clock_offset().as_secs_f64() * 1000.0),
                    delay_millis: Some(result.round_trip_delay().as_secs_f64() * 1000.0),
                })
            }
            .boxed()
        }
    }
}
