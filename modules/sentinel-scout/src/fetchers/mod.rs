mod browserless;
mod http;

pub use browserless::BrowserlessFetcher;
pub use http::HttpFetcher;

use spider_transformations::transformation::content::{
    transform_content_input, ReturnFormat, TransformConfig, TransformInput,
};
use tracing::{info, warn};

/// Review blocks usually sit outside the article body that Readability keeps,
/// so only page chrome (nav, footer, media) is dropped.
fn review_page_config() -> TransformConfig {
    TransformConfig {
        readability: false,
        main_content: true,
        return_format: ReturnFormat::Markdown,
        filter_images: true,
        filter_svg: true,
        clean_html: true,
    }
}

/// Turn a fetched page into the markdown handed to the extractor.
/// Empty string when nothing readable is left.
fn page_markdown(html: &[u8], url: &str, fetcher: &str) -> String {
    if html.iter().all(u8::is_ascii_whitespace) {
        warn!(url, fetcher, "Empty HTML response");
        return String::new();
    }

    let parsed_url = url::Url::parse(url).ok();
    let input = TransformInput {
        url: parsed_url.as_ref(),
        content: html,
        screenshot_bytes: None,
        encoding: None,
        selector_config: None,
        ignore_tags: None,
    };
    let markdown = transform_content_input(input, &review_page_config());

    let markdown = markdown.trim();
    if markdown.is_empty() {
        warn!(url, fetcher, "No text left after markdown conversion");
        return String::new();
    }

    info!(url, fetcher, bytes = markdown.len(), "Fetched successfully");
    markdown.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://shop.example.com/blender";

    #[test]
    fn blank_page_is_empty() {
        assert_eq!(page_markdown(b"", URL, "test"), "");
        assert_eq!(page_markdown(b"  \n\t ", URL, "test"), "");
    }

    #[test]
    fn review_text_survives_conversion() {
        let html = br#"<html><body>
            <nav><a href="/">Home</a></nav>
            <main>
              <h1>Blender 3000</h1>
              <section class="reviews">
                <div class="review"><h3>Loud but strong</h3><p>Crushes ice in seconds.</p></div>
              </section>
            </main>
            <footer>Copyright</footer>
        </body></html>"#;

        let markdown = page_markdown(html, URL, "test");

        assert!(markdown.contains("Crushes ice in seconds."));
        assert_eq!(markdown, markdown.trim());
    }

    #[test]
    fn images_are_filtered() {
        let html = br#"<html><body><main>
            <p>Solid build.</p><img src="https://cdn.example.com/photo.jpg" alt="photo">
        </main></body></html>"#;

        let markdown = page_markdown(html, URL, "test");

        assert!(markdown.contains("Solid build."));
        assert!(!markdown.contains("photo.jpg"));
    }
}
