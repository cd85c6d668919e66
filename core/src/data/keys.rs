/// Keys predefined for persistance:
/// Prefix used with node key, followed by node ID or RPC address
pub const NODE_KEY_PREFIX: &str = "node/";
/// Prefix used with cached location key, followed by host IP
pub const LOCATION_KEY_PREFIX: &str = "location/";
/// Prefix used with node address alias key, followed by RPC address
pub const ADDRESS_KEY_PREFIX: &str = "address/";
