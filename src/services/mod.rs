pub mod assemble;
pub mod canonical;
pub mod classify;
pub mod fetch;
pub mod hash;
pub mod integrity;
pub mod normalize;
pub mod pipeline;
pub mod publish;
pub mod store;
pub mod verify;
pub mod version;
