use ado_cli_output::{OutputFormat, OutputRenderer};
use anyhow::Result;
use serde::Serialize;

#[derive(Serialize)]
struct VersionInfo {
    version: &'static str,
    os: &'static str,
    arch: &'static str,
}

pub fn show(renderer: &OutputRenderer) -> Result<()> {
    let info = VersionInfo {
        version: env!("CARGO_PKG_VERSION"),
        os: std::env::consts::OS,
        arch: std::env::consts::ARCH,
    };

    match renderer.format() {
        OutputFormat::Table => {
            println!("ado {} ({}/{})", info.version, info.os, info.arch);
            Ok(())
        }
        _ => renderer.render(&info),
    }
}
