//! Normalization of the product detail payload.
//!
//! The endpoint has shipped several payload layouts over time. Each function
//! here handles one shape and returns an empty result for anything else, so
//! they can be chained without caring which layout a given product uses.

use serde_json::{Map, Value};

use super::ProductDetail;
use super::error::FetchError;
use crate::parser::ProductId;
use crate::quality::ensure_quality_param;

/// Fields that may carry the main image list, read in this order.
pub(crate) const IMAGE_FIELDS: [&str; 4] = ["detail_image", "detail_images", "images", "image"];

/// Fallback gallery field.
pub(crate) const GALLERY_FIELD: &str = "product_images";

const TITLE_FIELDS: [&str; 2] = ["title", "name"];
const URL_FIELDS: [&str; 2] = ["url", "uri"];

/// Builds a [`ProductDetail`] from a decoded payload.
pub(crate) fn detail_from_payload(
    product_id: &ProductId,
    payload: &Value,
) -> Result<ProductDetail, FetchError> {
    let data = payload_data(payload).ok_or_else(|| FetchError::no_data(product_id.as_str()))?;
    let record = product_record(data);

    let mut candidates: Vec<String> = IMAGE_FIELDS
        .iter()
        .filter_map(|field| record.get(*field))
        .flat_map(candidates_from_value)
        .collect();
    if candidates.is_empty() {
        candidates = gallery_candidates(record, data);
    }

    let images = normalize_image_urls(candidates);
    if images.is_empty() {
        return Err(FetchError::no_images(product_id.as_str()));
    }

    Ok(ProductDetail {
        product_id: product_id.clone(),
        title: title_of(record),
        images,
    })
}

/// `payload.data`, when it is a non-empty object.
fn payload_data(payload: &Value) -> Option<&Map<String, Value>> {
    payload
        .get("data")?
        .as_object()
        .filter(|data| !data.is_empty())
}

/// `data.product_info` when present, else `data` itself.
fn product_record(data: &Map<String, Value>) -> &Map<String, Value> {
    data.get("product_info")
        .and_then(Value::as_object)
        .filter(|info| !info.is_empty())
        .unwrap_or(data)
}

fn title_of(record: &Map<String, Value>) -> String {
    TITLE_FIELDS
        .iter()
        .find_map(|field| non_blank_str(record.get(*field)?))
        .unwrap_or_default()
}

/// Image candidates from one field value.
///
/// Accepted shapes: a list (of objects with `url`/`uri`, or of strings), a
/// mapping of arbitrary keys to URL strings, or a single string.
pub(crate) fn candidates_from_value(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(candidate_from_item).collect(),
        Value::Object(map) => map.values().filter_map(non_blank_str).collect(),
        Value::String(_) => non_blank_str(value).into_iter().collect(),
        _ => Vec::new(),
    }
}

fn candidate_from_item(item: &Value) -> Option<String> {
    match item {
        Value::String(_) => non_blank_str(item),
        Value::Object(map) => url_of_object(map),
        _ => None,
    }
}

fn url_of_object(map: &Map<String, Value>) -> Option<String> {
    URL_FIELDS
        .iter()
        .find_map(|field| non_blank_str(map.get(*field)?))
}

/// Gallery fallback: the record's gallery, else the one on `data`.
fn gallery_candidates(record: &Map<String, Value>, data: &Map<String, Value>) -> Vec<String> {
    [record, data]
        .into_iter()
        .filter_map(|source| source.get(GALLERY_FIELD)?.as_array())
        .find(|gallery| !gallery.is_empty())
        .map(|gallery| {
            gallery
                .iter()
                .filter_map(Value::as_object)
                .filter_map(url_of_object)
                .collect()
        })
        .unwrap_or_default()
}

fn non_blank_str(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Trims, absolutizes scheme-relative URLs, adds the quality parameter and
/// drops blanks and duplicates (first occurrence wins).
pub(crate) fn normalize_image_urls<I>(candidates: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut images: Vec<String> = Vec::new();
    for candidate in candidates {
        let trimmed = candidate.trim();
        if trimmed.is_empty() {
            continue;
        }
        let absolute = match trimmed.strip_prefix("//") {
            Some(rest) => format!("https://{rest}"),
            None => trimmed.to_string(),
        };
        let normalized = ensure_quality_param(&absolute);
        if !images.contains(&normalized) {
            images.push(normalized);
        }
    }
    images
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn id() -> ProductId {
        ProductId::new("123")
    }

    #[test]
    fn test_nested_product_info_list_of_objects() {
        let payload = json!({
            "data": {
                "product_info": {
                    "title": "测试商品",
                    "detail_images": [
                        {"url": "https://example.com/img1"},
                        {"url": "//example.com/img2"}
                    ]
                }
            }
        });
        let detail = detail_from_payload(&id(), &payload).unwrap();
        assert_eq!(detail.product_id, id());
        assert_eq!(detail.title, "测试商品");
        assert_eq!(
            detail.images,
            [
                "https://example.com/img1?ratio=1",
                "https://example.com/img2?ratio=1"
            ]
        );
    }

    #[test]
    fn test_flattened_record_under_data() {
        let payload = json!({"data": {"name": "平铺", "images": ["//cdn.example.com/a.jpg"]}});
        let detail = detail_from_payload(&id(), &payload).unwrap();
        assert_eq!(detail.title, "平铺");
        assert_eq!(detail.images, ["https://cdn.example.com/a.jpg?ratio=1"]);
    }

    #[test]
    fn test_three_shapes_normalize_identically() {
        let objects = json!([{"url": "//cdn.example.com/a.jpg"}, {"uri": "//cdn.example.com/b.jpg"}]);
        let strings = json!(["//cdn.example.com/a.jpg", " //cdn.example.com/b.jpg "]);
        let mapping = json!({"first": "//cdn.example.com/a.jpg", "second": "//cdn.example.com/b.jpg"});

        let expected = [
            "https://cdn.example.com/a.jpg?ratio=1",
            "https://cdn.example.com/b.jpg?ratio=1",
        ];
        for shape in [objects, strings, mapping] {
            let payload = json!({"data": {"product_info": {"detail_image": shape}}});
            let detail = detail_from_payload(&id(), &payload).unwrap();
            assert_eq!(detail.images, expected);
        }
    }

    #[test]
    fn test_fields_accumulate_in_order_without_duplicates() {
        let payload = json!({
            "data": {
                "detail_image": "https://cdn.example.com/x.jpg",
                "images": ["https://cdn.example.com/y.jpg", "https://cdn.example.com/x.jpg"]
            }
        });
        let detail = detail_from_payload(&id(), &payload).unwrap();
        assert_eq!(
            detail.images,
            [
                "https://cdn.example.com/x.jpg?ratio=1",
                "https://cdn.example.com/y.jpg?ratio=1"
            ]
        );
    }

    #[test]
    fn test_gallery_fallback_on_record() {
        let payload = json!({
            "data": {"product_info": {"title": "t", "product_images": [{"uri": "//cdn.example.com/g.jpg"}]}}
        });
        let detail = detail_from_payload(&id(), &payload).unwrap();
        assert_eq!(detail.images, ["https://cdn.example.com/g.jpg?ratio=1"]);
    }

    #[test]
    fn test_gallery_fallback_on_data() {
        let payload = json!({
            "data": {
                "product_info": {"title": "t"},
                "product_images": [{"url": "https://cdn.example.com/g.jpg?ratio=1"}, "ignored"]
            }
        });
        let detail = detail_from_payload(&id(), &payload).unwrap();
        assert_eq!(detail.images, ["https://cdn.example.com/g.jpg?ratio=1"]);
    }

    #[test]
    fn test_missing_data_is_no_data() {
        for payload in [json!({}), json!({"data": null}), json!({"data": {}}), json!([1, 2])] {
            let err = detail_from_payload(&id(), &payload).unwrap_err();
            assert!(matches!(err, FetchError::NoData { .. }), "payload {payload}");
        }
    }

    #[test]
    fn test_blank_images_is_no_images() {
        let payload = json!({"data": {"product_info": {"title": "t", "images": ["", "   "]}}});
        let err = detail_from_payload(&id(), &payload).unwrap_err();
        assert!(matches!(err, FetchError::NoImages { .. }));
    }

    #[test]
    fn test_title_defaults_to_empty() {
        let payload = json!({"data": {"title": "", "image": "https://cdn.example.com/a.jpg"}});
        let detail = detail_from_payload(&id(), &payload).unwrap();
        assert_eq!(detail.title, "");
    }

    #[test]
    fn test_unknown_shapes_are_ignored() {
        assert!(candidates_from_value(&json!(42)).is_empty());
        assert!(candidates_from_value(&json!([1, null, {"href": "x"}])).is_empty());
    }
}
