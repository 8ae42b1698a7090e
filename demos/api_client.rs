/// Example HTTP client driving the address form server
///
/// Run the server first:
/// ```bash
/// cargo run --bin server
/// ```
///
/// Then run this example:
/// ```bash
/// cargo run --example api_client
/// ```

use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct InputRequest<'a> {
    field: &'a str,
    value: &'a str,
}

#[derive(Deserialize, Debug)]
struct FormResponse {
    success: bool,
    data: FormData,
    lookup: Option<String>,
    message: Option<String>,
}

#[derive(Deserialize, Debug)]
struct FormData {
    cep: String,
    logradouro: String,
    numero: String,
    complemento: String,
    bairro: String,
    cidade: String,
    uf: String,
}

#[derive(Deserialize, Debug)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Deserialize, Debug)]
struct SubmitResponse {
    message: String,
}

fn print_form(data: &FormData) {
    println!("   cep:         {}", data.cep);
    println!("   logradouro:  {}", data.logradouro);
    println!("   numero:      {}", data.numero);
    println!("   complemento: {}", data.complemento);
    println!("   bairro:      {}", data.bairro);
    println!("   cidade:      {}", data.cidade);
    println!("   uf:          {}", data.uf);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let base_url = std::env::var("API_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
    let client = reqwest::Client::new();

    println!("=== Address Form HTTP API Demo ===\n");

    // 1. Health Check
    println!("1. Checking server health...");
    let health: HealthResponse = client
        .get(format!("{}/health", base_url))
        .send()
        .await?
        .json()
        .await?;
    println!("   Server status: {}", health.status);
    println!("   Version: {}\n", health.version);

    // 2. Type a CEP one keystroke at a time, like the page does
    println!("2. Typing CEP 01310930...");
    let input_url = format!("{}/api/form/input", base_url);
    let mut typed = String::new();
    let mut last: Option<FormResponse> = None;
    for ch in "01310930".chars() {
        typed.push(ch);
        let response = client
            .post(&input_url)
            .json(&InputRequest {
                field: "cep",
                value: &typed,
            })
            .send()
            .await?;
        if !response.status().is_success() {
            println!("   Error: {}\n", response.text().await?);
            return Ok(());
        }
        let form: FormResponse = response.json().await?;
        println!("   {:<9} -> {}", typed, form.data.cep);
        last = Some(form);
    }

    if let Some(form) = &last {
        println!(
            "\n   Lookup: {} (success: {})",
            form.lookup.as_deref().unwrap_or("none"),
            form.success
        );
        if let Some(message) = &form.message {
            println!("   Alert: {}", message);
        }
        print_form(&form.data);
        println!();
    }

    // 3. Fill in the number
    println!("3. Setting number...");
    let form: FormResponse = client
        .post(&input_url)
        .json(&InputRequest {
            field: "numero",
            value: "1578",
        })
        .send()
        .await?
        .json()
        .await?;
    print_form(&form.data);
    println!();

    // 4. Submit
    println!("4. Submitting...");
    let submitted: SubmitResponse = client
        .post(format!("{}/api/form/submit", base_url))
        .send()
        .await?
        .json()
        .await?;
    println!("   {}\n", submitted.message);

    // 5. Clear
    println!("5. Clearing...");
    let form: FormResponse = client
        .post(format!("{}/api/form/clear", base_url))
        .send()
        .await?
        .json()
        .await?;
    print_form(&form.data);

    println!("\n=== Demo Complete ===");

    Ok(())
}
