pub const MOTIFSCAN_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const MOTIFSCAN_BUILD_N: &str = env!("MOTIFSCAN_BUILD_N");

pub fn version_cli_text() -> String {
    format!(
        "motifscan {}\nBuild {}\nStructural DNA motif scanner",
        MOTIFSCAN_VERSION, MOTIFSCAN_BUILD_N
    )
}
