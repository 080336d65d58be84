//! Best-effort classification of provider errors into user-actionable advice.
//!
//! Maps substrings of provider error text to the environment variable(s) most
//! likely at fault. The classification is necessarily fuzzy: several keys can
//! match the same message, and all matches are reported.

/// Provider key env var paired with the error substrings that implicate it.
const API_KEY_EXCEPTIONS: &[(&str, &[&str])] = &[
    ("OPENAI_API_KEY", &["OPENAI_API_KEY", "Incorrect API key provided"]),
    (
        "ANTHROPIC_API_KEY",
        &[
            "ANTHROPIC_API_KEY",
            "anthropic_api_key",
            "invalid x-api-key",
            "credit balance",
        ],
    ),
    (
        "GOOGLE_API_KEY",
        &[
            "Application Default Credentials",
            "default credentials",
            "API key not valid",
        ],
    ),
    (
        "AZURE_OPENAI_API_KEY",
        &[
            "Error code: 401",
            "invalid subscription key",
            "wrong API endpoint",
            "Connection error",
        ],
    ),
    (
        "AZURE_OPENAI_ENDPOINT",
        &[
            "validation error",
            "base_url",
            "azure_endpoint",
            "AZURE_OPENAI_ENDPOINT",
            "Connection error",
        ],
    ),
    (
        "OPENAI_API_VERSION",
        &[
            "validation error",
            "api_version",
            "OPENAI_API_VERSION",
            "Error code: 404",
            "Resource not found",
        ],
    ),
    (
        "deployment_name",
        &[
            "Error code: 404",
            "Resource not found",
            "API deployment for this resource does not exist",
        ],
    ),
];

/// Returns a more helpful message when the error text looks like an API-key,
/// endpoint, or credit problem, or `None` when it does not.
pub fn check_for_api_key_exception(error_message: &str) -> Option<String> {
    let mut matched_keys: Vec<&str> = Vec::new();
    for (api_key, fragments) in API_KEY_EXCEPTIONS {
        if fragments
            .iter()
            .any(|fragment| error_message.contains(fragment))
        {
            matched_keys.push(api_key);
        }
    }

    if matched_keys.is_empty() {
        return None;
    }

    let keys_str = matched_keys.join(", ");
    Some(format!(
        "A value for the {keys_str} environment variable must be correctly set in the \
         server or run-time environment in order to use this agent network.\n\
         Some things to try:\n\
         1) Double check that your value for {keys_str} is set correctly\n\
         2) If you do not have a value for {keys_str}, visit the LLM provider's website to get one.\n\
         3) It's possible that your credit balance on your account with the LLM provider is too low\n\
         \x20  to make the request. Check that.\n\
         4) Sometimes these errors happen because of firewall blockages to the site that hosts the LLM.\n\
         \x20  Try checking that you can reach the regular UI for the LLM from a web browser\n\
         \x20  on the same machine making this request."
    ))
}
