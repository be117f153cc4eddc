/// Builds the gRPC client and server code for the calendar protocol using
/// `tonic-prost-build`.
///
/// Both service definitions are compiled in one pass so that they share a
/// single encoded file descriptor set, which the servers hand to the
/// reflection service.
///
/// # Files and Paths
///
/// - Proto files: `proto/account.proto`, `proto/web_api.proto`
/// - Includes: `proto/`
///
/// # Output
///
/// ```rust,ignore
/// pub mod account {
///     tonic::include_proto!("calendar.account");
/// }
/// pub mod webapi {
///     tonic::include_proto!("calendar.webapi");
/// }
/// ```
///
/// # Panics
///
/// Panics if code generation fails; a broken protocol definition is a build
/// error.
use std::env;
use std::path::PathBuf;
fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let descriptor_path = out_dir.join("calendar_descriptor.bin");

    let mut config = tonic_prost_build::Config::new();
    config.file_descriptor_set_path(&descriptor_path);

    tonic_prost_build::configure()
        .compile_with_config(
            config,
            &["proto/account.proto", "proto/web_api.proto"],
            &["proto"],
        )
        .unwrap();
}
