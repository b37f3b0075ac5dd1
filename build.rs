fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Seed value for a DS3231 that reports oscillator-stop at boot.
    // Falls back to 0 (RTC left untouched) if the host clock is unusable.
    let build_epoch = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    println!("cargo:rustc-env=DACMON_BUILD_EPOCH={build_epoch}");

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
