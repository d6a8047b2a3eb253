fn main() {
    // The ESP-IDF build system only applies when targeting ESP32 (Xtensa).
    // Build scripts run on the host, so the TARGET env var is checked here
    // rather than a cfg attribute.
    if let Ok(target) = std::env::var("TARGET") {
        if target.contains("xtensa") {
            embuild::espidf::sysenv::output();
        }
    }
}
