pub fn meshauth_version_str() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
