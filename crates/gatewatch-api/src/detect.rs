// Gateway model detection
//
// Runs once at startup. A pinned model is trusted without probing; "auto"
// walks the fixed priority order and keeps the first client whose probe
// succeeds.

use tracing::{debug, info};
use url::Url;

use crate::error::Error;
use crate::status::{GatewayModel, GatewayStatus, ModelSelection};
use crate::transport::TransportConfig;
use crate::vendor::{GatewayClient, VendorClient};

/// Outcome of a successful detection.
#[derive(Debug)]
pub struct Detected {
    pub client: VendorClient,
    /// The probe result, when detection had to probe.
    pub probe: Option<GatewayStatus>,
}

impl Detected {
    pub fn model(&self) -> GatewayModel {
        self.client.model()
    }
}

/// Select the vendor client for the gateway at `base_url`.
///
/// Every probed-but-rejected client is closed. When every candidate fails,
/// the returned `DetectionFailed` carries the last probe error.
pub async fn detect(
    selection: ModelSelection,
    base_url: &Url,
    transport: &TransportConfig,
) -> Result<Detected, Error> {
    if let ModelSelection::Fixed(model) = selection {
        debug!(%model, "gateway model pinned, skipping detection");
        let client = VendorClient::new(model, base_url.clone(), transport)?;
        return Ok(Detected { client, probe: None });
    }

    let mut last_err = None;
    for model in GatewayModel::DETECTION_ORDER {
        let client = VendorClient::new(model, base_url.clone(), transport)?;
        match client.get_status().await {
            Ok(status) => {
                info!(%model, url = %base_url, "detected gateway model");
                return Ok(Detected {
                    client,
                    probe: Some(status),
                });
            }
            Err(e) => {
                debug!(%model, error = %e, "detection probe failed");
                client.close();
                last_err = Some(e);
            }
        }
    }

    Err(Error::DetectionFailed {
        last: Box::new(last_err.unwrap_or(Error::Unsupported {
            model: "auto".into(),
        })),
    })
}
