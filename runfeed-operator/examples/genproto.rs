//! Generate updated proto code for the run completion event trigger client.
//!
//! This is setup as an example instead of as part of the build.rs so that building the operator
//! does not require protoc.

use anyhow::{Context, Result};

fn main() -> Result<()> {
    tonic_build::configure()
        .out_dir("src/grpc")
        .build_client(true)
        .build_server(false)
        .compile(&["../proto/run_completion_event_trigger.proto"], &["../proto"])
        .context("error compiling run_completion_event_trigger proto")?;

    Ok(())
}
