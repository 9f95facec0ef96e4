/// The type to represent meshauth results.
pub type MeshAuthResult<T = ()> = anyhow::Result<T>;
