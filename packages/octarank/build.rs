fn main() {
	println!("cargo:rerun-if-env-changed=OCTARANK_VERSION");

	if std::env::var_os("OCTARANK_VERSION").is_none() {
		println!(
			"cargo:rustc-env=OCTARANK_VERSION=v{}",
			std::env::var("CARGO_PKG_VERSION").unwrap()
		);
	}
}
