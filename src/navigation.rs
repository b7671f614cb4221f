//! Link resolution, redirects and body classification
//!
//! This is the surface a front-end drives: hand it whatever the user typed or
//! clicked plus the page currently shown, get back either a final response or
//! an input prompt.

use crate::address::Address;
use crate::charset::latin1_to_string;
use crate::gemini::{Error, GeminiClient, Response, Result, StatusCategory};
use crate::gemtext::{self, GemtextBlock, GemtextOptions};
use bytes::Bytes;

/// Default limit on consecutive redirects
pub const DEFAULT_MAX_REDIRECTS: usize = 5;

/// Body of a successful response, by media type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Gemtext(Vec<GemtextBlock>),
    Plaintext(String),
    /// Anything else; the caller decides what to do with the bytes
    Opaque(Bytes),
}

/// Classify a response body by its meta
pub fn classify(response: &Response) -> Content {
    classify_with(response, &GemtextOptions::default())
}

/// Classify a response body, parsing Gemtext with `options`
pub fn classify_with(response: &Response, options: &GemtextOptions) -> Content {
    let meta = response.meta();
    if meta.contains("text/gemini") {
        Content::Gemtext(gemtext::parse_with(response.body(), options))
    } else if meta.contains("text/plain") {
        Content::Plaintext(latin1_to_string(response.body()))
    } else {
        Content::Opaque(Bytes::copy_from_slice(response.body()))
    }
}

/// Navigation configuration
#[derive(Debug, Clone)]
pub struct NavigatorConfig {
    pub max_redirects: usize,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        NavigatorConfig {
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

/// Result of a navigation
#[derive(Debug)]
pub enum Outcome {
    /// Final response at `address` (after redirects)
    Page { address: Address, response: Response },
    /// The capsule asked for input (status 10 or 11)
    Input {
        address: Address,
        prompt: String,
        sensitive: bool,
    },
}

impl Outcome {
    /// Address the outcome belongs to
    pub fn address(&self) -> &Address {
        match self {
            Outcome::Page { address, .. } | Outcome::Input { address, .. } => address,
        }
    }
}

/// Performs one request
pub trait Fetch {
    fn fetch(&self, address: &Address) -> Result<Response>;
}

impl Fetch for GeminiClient {
    fn fetch(&self, address: &Address) -> Result<Response> {
        self.request(address)
    }
}

/// Resolves user input against the current page and follows redirects
pub struct Navigator<F: Fetch = GeminiClient> {
    fetcher: F,
    config: NavigatorConfig,
}

impl<F: Fetch> Navigator<F> {
    pub fn new(fetcher: F, config: NavigatorConfig) -> Self {
        Navigator { fetcher, config }
    }

    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Turn typed or clicked text into an address
    ///
    /// Complete addresses win. Without a current page anything else is an
    /// invalid address; with one, the text is resolved as a link on it.
    pub fn resolve(&self, raw: &str, current: Option<&Address>) -> Result<Address> {
        match Address::parse(raw) {
            Ok(address) => Ok(address),
            Err(e) => match current {
                None => Err(e.into()),
                Some(current) => current
                    .resolve_link(raw)
                    .map_err(|_| Error::NotGeminiLink(raw.to_string())),
            },
        }
    }

    /// Resolve `raw`, request it and follow redirects
    pub fn resolve_and_request(&self, raw: &str, current: Option<&Address>) -> Result<Outcome> {
        let address = self.resolve(raw, current)?;
        self.follow(address)
    }

    /// Answer an input prompt by re-requesting `address` with `text` as the query
    pub fn submit_input(&self, address: &Address, text: &str) -> Result<Outcome> {
        self.follow(address.with_query(text)?)
    }

    fn follow(&self, mut address: Address) -> Result<Outcome> {
        let mut redirects = 0;

        loop {
            let response = self.fetcher.fetch(&address)?;

            match response.status().category() {
                StatusCategory::Input | StatusCategory::SensitiveInput => {
                    let sensitive = response.status().category() == StatusCategory::SensitiveInput;
                    return Ok(Outcome::Input {
                        address,
                        prompt: response.meta().to_string(),
                        sensitive,
                    });
                }
                StatusCategory::Redirect => {
                    if redirects == self.config.max_redirects {
                        log::warn!("giving up on {} after {} redirects", address, redirects);
                        return Err(Error::TooManyRedirects(self.config.max_redirects));
                    }
                    redirects += 1;

                    if response.meta().trim().is_empty() {
                        return Err(Error::MalformedResponse(format!(
                            "redirect from {} without a target",
                            address
                        )));
                    }
                    let target = address
                        .resolve_link(response.meta())
                        .map_err(|_| Error::NotGeminiLink(response.meta().to_string()))?;
                    log::debug!("redirect {} -> {} ({})", address, target, response.status());
                    address = target;
                }
                _ => return Ok(Outcome::Page { address, response }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::{ConnectionError, Status};
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Canned responses keyed by request URL; records the requests made
    #[derive(Default)]
    struct FakeCapsule {
        routes: HashMap<String, (u8, &'static str, &'static [u8])>,
        requests: RefCell<Vec<String>>,
    }

    impl FakeCapsule {
        fn route(mut self, url: &str, status: u8, meta: &'static str, body: &'static [u8]) -> Self {
            self.routes.insert(url.to_string(), (status, meta, body));
            self
        }
    }

    impl Fetch for FakeCapsule {
        fn fetch(&self, address: &Address) -> Result<Response> {
            let url = address.reconstructed_url();
            self.requests.borrow_mut().push(url.clone());
            match self.routes.get(&url) {
                Some((status, meta, body)) => Ok(Response::new(Status::new(*status)?, *meta, *body)),
                None => Err(ConnectionError::EmptyResponse.into()),
            }
        }
    }

    fn navigator(capsule: FakeCapsule) -> Navigator<FakeCapsule> {
        Navigator::new(capsule, NavigatorConfig::default())
    }

    fn address(raw: &str) -> Address {
        Address::parse(raw).unwrap()
    }

    #[test]
    fn test_classify() {
        let gemtext = Response::new(Status::SUCCESS, "text/gemini; lang=en", &b"# Hi\n"[..]);
        assert_eq!(
            classify(&gemtext),
            Content::Gemtext(vec![GemtextBlock::heading(1, "Hi")])
        );

        let plain = Response::new(Status::SUCCESS, "text/plain", &b"caf\xe9"[..]);
        assert_eq!(classify(&plain), Content::Plaintext("caf\u{e9}".to_string()));

        let image = Response::new(Status::SUCCESS, "image/png", &b"\x89PNG"[..]);
        assert_eq!(classify(&image), Content::Opaque(Bytes::from_static(b"\x89PNG")));
    }

    #[test]
    fn test_classify_with_options() {
        let response = Response::new(Status::SUCCESS, "text/gemini", &b"text\r\n"[..]);
        let options = GemtextOptions {
            strip_carriage_returns: true,
        };
        assert_eq!(
            classify_with(&response, &options),
            Content::Gemtext(vec![GemtextBlock::paragraph("text")])
        );
    }

    #[test]
    fn test_resolve() {
        let nav = navigator(FakeCapsule::default());
        let current = address("gemini://example.com/docs/index.gmi");

        assert_eq!(
            nav.resolve("gemini://other.test/", Some(&current)).unwrap(),
            address("gemini://other.test/")
        );
        assert_eq!(
            nav.resolve("page.gmi", Some(&current)).unwrap(),
            address("gemini://example.com/docs/page.gmi")
        );
        assert!(matches!(
            nav.resolve("https://example.com/", Some(&current)),
            Err(Error::NotGeminiLink(_))
        ));
        assert!(matches!(
            nav.resolve("page.gmi", None),
            Err(Error::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_page() {
        let nav = navigator(FakeCapsule::default().route(
            "gemini://example.com/",
            20,
            "text/gemini",
            b"# Home\n",
        ));

        match nav.resolve_and_request("gemini://example.com/", None).unwrap() {
            Outcome::Page { address, response } => {
                assert_eq!(address.reconstructed_url(), "gemini://example.com/");
                assert_eq!(response.body(), b"# Home\n");
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_terminal_status_is_page() {
        let nav = navigator(FakeCapsule::default().route(
            "gemini://example.com/missing.gmi",
            51,
            "Not found",
            b"",
        ));

        let outcome = nav
            .resolve_and_request("gemini://example.com/missing.gmi", None)
            .unwrap();
        match outcome {
            Outcome::Page { response, .. } => {
                assert_eq!(response.status(), Status::NOT_FOUND);
                assert_eq!(response.meta(), "Not found");
                assert!(response.body().is_empty());
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_input_and_submit() {
        let nav = navigator(
            FakeCapsule::default()
                .route("gemini://example.com/search", 10, "Query?", b"")
                .route("gemini://example.com/login", 11, "Password", b"")
                .route("gemini://example.com/search?two%20words", 20, "text/plain", b"found"),
        );

        let outcome = nav.resolve_and_request("gemini://example.com/search", None).unwrap();
        let search = match outcome {
            Outcome::Input {
                address,
                prompt,
                sensitive,
            } => {
                assert_eq!(prompt, "Query?");
                assert!(!sensitive);
                address
            }
            other => panic!("unexpected outcome {:?}", other),
        };

        let outcome = nav.resolve_and_request("gemini://example.com/login", None).unwrap();
        assert!(matches!(outcome, Outcome::Input { sensitive: true, .. }));

        let outcome = nav.submit_input(&search, "two words").unwrap();
        assert_eq!(
            outcome.address().reconstructed_url(),
            "gemini://example.com/search?two%20words"
        );
        assert!(matches!(outcome, Outcome::Page { .. }));
    }

    #[test]
    fn test_redirect_chain() {
        let nav = navigator(
            FakeCapsule::default()
                .route("gemini://example.com/old/", 31, "gemini://example.com/new/", b"")
                .route("gemini://example.com/new/", 30, "index.gmi", b"")
                .route("gemini://example.com/new/index.gmi", 20, "text/gemini", b"moved\n"),
        );

        let outcome = nav.resolve_and_request("gemini://example.com/old/", None).unwrap();
        assert_eq!(
            outcome.address().reconstructed_url(),
            "gemini://example.com/new/index.gmi"
        );
        assert_eq!(
            *nav.fetcher().requests.borrow(),
            vec![
                "gemini://example.com/old/",
                "gemini://example.com/new/",
                "gemini://example.com/new/index.gmi",
            ]
        );
    }

    #[test]
    fn test_redirect_loop() {
        let nav = navigator(
            FakeCapsule::default()
                .route("gemini://example.com/a", 30, "b", b"")
                .route("gemini://example.com/b", 30, "a", b""),
        );

        let err = nav.resolve_and_request("gemini://example.com/a", None).unwrap_err();
        assert!(matches!(err, Error::TooManyRedirects(5)));
        // First request plus five followed redirects
        assert_eq!(nav.fetcher().requests.borrow().len(), 6);
    }

    #[test]
    fn test_redirect_limit_zero() {
        let nav = Navigator::new(
            FakeCapsule::default().route("gemini://example.com/a", 30, "b", b""),
            NavigatorConfig { max_redirects: 0 },
        );

        let err = nav.resolve_and_request("gemini://example.com/a", None).unwrap_err();
        assert!(matches!(err, Error::TooManyRedirects(0)));
    }

    #[test]
    fn test_redirect_to_other_scheme() {
        let nav = navigator(FakeCapsule::default().route(
            "gemini://example.com/web",
            31,
            "https://example.com/",
            b"",
        ));

        let err = nav.resolve_and_request("gemini://example.com/web", None).unwrap_err();
        assert!(matches!(err, Error::NotGeminiLink(_)));
    }

    #[test]
    fn test_redirect_without_target() {
        let nav = navigator(
            FakeCapsule::default()
                .route("gemini://example.com/docs/moved", 30, "", b"")
                .route("gemini://example.com/docs/", 20, "text/gemini", b"index\n"),
        );

        let err = nav.resolve_and_request("gemini://example.com/docs/moved", None).unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
        assert_eq!(nav.fetcher().requests.borrow().len(), 1);
    }

    #[test]
    fn test_request_failure_is_not_retried() {
        let nav = navigator(FakeCapsule::default());

        let err = nav.resolve_and_request("gemini://example.com/", None).unwrap_err();
        assert!(err.is_request_failure());
        assert_eq!(nav.fetcher().requests.borrow().len(), 1);
    }
}
