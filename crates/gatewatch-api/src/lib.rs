// gatewatch-api: Async clients for 5G/LTE home gateway status endpoints

pub mod detect;
pub mod error;
pub mod raw;
pub mod status;
pub mod transport;
pub mod vendor;

pub use detect::{Detected, detect};
pub use error::{Error, ErrorKind};
pub use raw::RawField;
pub use status::{
    CellInfo, ConnectionInfo, GatewayModel, GatewayStatus, ModelSelection, RadioKind, RadioStats,
    Signal,
};
pub use transport::{BasicCredentials, TransportConfig};
pub use vendor::{ArcadyanClient, GatewayClient, NokiaClient, SagemcomClient, VendorClient};
