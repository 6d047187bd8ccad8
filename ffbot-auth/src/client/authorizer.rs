use crate::error::AuthError;

/// Operator-facing side channel used when no stored grant works anymore:
/// show an authorization URL, take back one line (the code).
pub trait Authorizer: Send + Sync {
    fn authorize(&self, authorization_url: &str) -> Result<String, AuthError>;
}

/// Prompts on the controlling terminal and tries to open the browser
pub struct ConsoleAuthorizer;

impl Authorizer for ConsoleAuthorizer {
    fn authorize(&self, authorization_url: &str) -> Result<String, AuthError> {
        tracing::info!("Authorization code has expired, generating link to renew");

        println!("\n=== Yahoo Authorization Required ===\n");
        if let Err(e) = open::that(authorization_url) {
            eprintln!("Failed to open browser automatically: {}", e);
            eprintln!("\nPlease open this URL in your browser:");
        } else {
            println!("Browser opened. You can also open this URL directly:");
        }
        println!("{}\n", authorization_url);
        println!("Enter the code generated by the popup:");

        let mut input = String::new();
        let read = std::io::stdin().read_line(&mut input)?;
        if read == 0 {
            return Err(AuthError::Authorization(
                "stdin closed before a code was entered".to_string(),
            ));
        }

        let code = input.trim();
        if code.is_empty() {
            return Err(AuthError::Authorization("empty authorization code".to_string()));
        }
        Ok(code.to_string())
    }
}
