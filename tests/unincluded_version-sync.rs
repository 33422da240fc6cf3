#![cfg(not(target_arch = "wasm32"))]

#[test]
fn html_root_url() {
	version_sync::assert_html_root_url_updated!("src/lib.rs");
}

#[test]
fn readme_deps() {
	version_sync::assert_markdown_deps_updated!("README.md");
}

#[test]
fn readme_rust_badge() {
	let rust_version = include_str!("../Cargo.toml")
		.lines()
		.find_map(|line| line.strip_prefix("rust-version = \"")?.strip_suffix('"'))
		.unwrap();
	let badge = format!("![Rust {0}](https://img.shields.io/static/v1?logo=Rust&label=&message={0}&color=grey)", rust_version);
	assert!(include_str!("../README.md").contains(&badge));
}
