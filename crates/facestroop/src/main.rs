#![forbid(unsafe_code)]

fn main() {
    if let Err(error) = facestroop::run_from_env() {
        if std::env::args().any(|arg| arg == "--log-json") {
            eprintln!(
                "{}",
                serde_json::json!({
                    "status": "error",
                    "error": error.to_string(),
                    "exit_code": error.exit_code(),
                })
            );
        } else {
            eprintln!("error: {error}");
        }
        std::process::exit(error.exit_code());
    }
}
