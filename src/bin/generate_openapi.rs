use utoipa::OpenApi;
use videotube_backend::ApiDoc;

fn main() {
    println!("Generating OpenAPI specification...");

    let openapi = ApiDoc::openapi();

    match serde_json::to_string_pretty(&openapi) {
        Ok(json) => {
            println!("OpenAPI JSON generated successfully!");
            println!("Length: {} characters", json.len());
            println!("Endpoints found: {}", openapi.paths.paths.len());
            println!("\nAPI Title: {}", openapi.info.title);
            println!("API Version: {}", openapi.info.version);

            if let Err(e) = std::fs::write("openapi.json", &json) {
                eprintln!("Failed to write openapi.json: {}", e);
                std::process::exit(1);
            }
            println!("\nOpenAPI specification saved to openapi.json");
        }
        Err(e) => {
            eprintln!("Failed to serialize OpenAPI specification: {}", e);
            std::process::exit(1);
        }
    }
}
