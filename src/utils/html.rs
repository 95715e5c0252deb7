/// Sanitizes admin-entered free text (exam and category descriptions)
/// before it is stored.
///
/// Whitelist-based: formatting tags such as <b> and <p> survive, while
/// <script>, <iframe> and event-handler attributes are stripped, so a
/// description can be rendered as HTML by the dashboard without becoming
/// a stored XSS vector.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input).trim().to_string()
}
