use axum::http::{header, HeaderMap, Uri};

use np_types::wire::{Page, Paginated};

/// Wrap a result page in the `{count, next, previous, results}` envelope.
/// The neighbor URLs are the request URL with only `page` replaced.
pub fn envelope<T>(
    uri: &Uri,
    headers: &HeaderMap,
    page: u32,
    page_size: u32,
    data: Page<T>,
) -> Paginated<T> {
    let next = if (page as i64) * (page_size as i64) < data.total {
        Some(page + 1)
    } else {
        None
    };
    let previous = if page > 1 { Some(page - 1) } else { None };
    Paginated {
        count: data.total,
        next: next.map(|p| page_url(uri, headers, p)),
        previous: previous.map(|p| page_url(uri, headers, p)),
        results: data.rows,
    }
}

fn page_url(uri: &Uri, headers: &HeaderMap, page: u32) -> String {
    let query = with_page(uri.query(), page);
    match headers.get(header::HOST).and_then(|v| v.to_str().ok()) {
        Some(host) => format!("http://{}{}?{}", host, uri.path(), query),
        None => format!("{}?{}", uri.path(), query),
    }
}

/// Rebuild a raw query string with `page` set to the given value, keeping
/// every other pair untouched and in order.
fn with_page(query: Option<&str>, page: u32) -> String {
    let mut pairs: Vec<String> = Vec::new();
    let mut replaced = false;
    if let Some(query) = query {
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            if pair.split('=').next() == Some("page") {
                if !replaced {
                    pairs.push(format!("page={}", page));
                    replaced = true;
                }
            } else {
                pairs.push(pair.to_string());
            }
        }
    }
    if !replaced {
        pairs.push(format!("page={}", page));
    }
    pairs.join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_of(total: i64, rows: usize) -> Page<u32> {
        Page {
            rows: vec![0; rows],
            total,
        }
    }

    fn host_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "ihr.example.org".parse().unwrap());
        headers
    }

    #[test]
    fn replaces_existing_page_parameter() {
        assert_eq!(with_page(Some("af=4&page=2&asn=2497"), 3), "af=4&page=3&asn=2497");
    }

    #[test]
    fn appends_page_when_absent() {
        assert_eq!(with_page(Some("af=4"), 2), "af=4&page=2");
        assert_eq!(with_page(None, 2), "page=2");
    }

    #[test]
    fn first_page_has_no_previous() {
        let uri: Uri = "/hegemony/?af=4".parse().unwrap();
        let body = envelope(&uri, &host_headers(), 1, 100, page_of(250, 100));
        assert_eq!(body.count, 250);
        assert_eq!(
            body.next.as_deref(),
            Some("http://ihr.example.org/hegemony/?af=4&page=2")
        );
        assert!(body.previous.is_none());
    }

    #[test]
    fn middle_page_has_both_neighbors() {
        let uri: Uri = "/hegemony/?page=2".parse().unwrap();
        let body = envelope(&uri, &host_headers(), 2, 100, page_of(250, 100));
        assert_eq!(
            body.next.as_deref(),
            Some("http://ihr.example.org/hegemony/?page=3")
        );
        assert_eq!(
            body.previous.as_deref(),
            Some("http://ihr.example.org/hegemony/?page=1")
        );
    }

    #[test]
    fn last_page_has_no_next() {
        let uri: Uri = "/hegemony/?page=3".parse().unwrap();
        let body = envelope(&uri, &host_headers(), 3, 100, page_of(250, 50));
        assert!(body.next.is_none());
        assert_eq!(
            body.previous.as_deref(),
            Some("http://ihr.example.org/hegemony/?page=2")
        );
    }

    #[test]
    fn exact_multiple_of_page_size_has_no_phantom_next() {
        let uri: Uri = "/networks".parse().unwrap();
        let body = envelope(&uri, &host_headers(), 2, 100, page_of(200, 100));
        assert!(body.next.is_none());
    }

    #[test]
    fn missing_host_falls_back_to_relative_urls() {
        let uri: Uri = "/networks?name=iij".parse().unwrap();
        let body = envelope(&uri, &HeaderMap::new(), 1, 10, page_of(30, 10));
        assert_eq!(body.next.as_deref(), Some("/networks?name=iij&page=2"));
    }
}
