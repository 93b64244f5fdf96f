pub mod export;
pub mod import;
pub mod spotify;
pub mod ytmusic;
