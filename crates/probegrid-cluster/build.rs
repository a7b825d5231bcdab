fn main() -> Result<(), Box<dyn std::error::Error>> {
    std::env::set_var(
        "PROTOC",
        protoc_bin_vendored::protoc_bin_path().expect("bundled protoc binary"),
    );
    let proto_file = "proto/probegrid.proto";
    tonic_build::configure().compile_protos(&[proto_file], &["proto"])?;
    println!("cargo:rerun-if-changed={proto_file}");
    Ok(())
}
