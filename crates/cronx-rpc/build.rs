use std::{env, error::Error};

const PROTO: &str = "proto/cronx/v1/worker.proto";

fn main() -> Result<(), Box<dyn Error>> {
    let protoc = protoc_bin_vendored::protoc_bin_path()
        .map_err(|e| format!("vendored protoc unavailable: {e:?}"))?;
    unsafe {
        env::set_var("PROTOC", &protoc);
    }
    println!("cargo:rerun-if-changed={PROTO}");

    // Master-only builds skip the server stubs.
    let with_server = env::var_os("CARGO_FEATURE_SERVER").is_some();
    tonic_build::configure()
        .build_server(with_server)
        .build_client(true)
        .compile_protos(&[PROTO], &["proto"])?;
    Ok(())
}
