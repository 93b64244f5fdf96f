pub mod source;
pub mod spotify;
pub mod ytmusic;
