use serde::{de, Deserialize, Deserializer, Serialize};

/// A row of the `libros` table as exposed over HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    pub id: i64,
    pub nombre: String,
    pub autor: String,
    pub categoria: Option<String>,
    #[serde(rename = "año-publicacion")]
    #[sqlx(rename = "año-publicacion")]
    pub anio_publicacion: Option<i32>,
    #[serde(rename = "ISBN")]
    #[sqlx(rename = "ISBN")]
    pub isbn: String,
}

/// Raw request body for create and update.
///
/// Every field is optional so that missing values surface as validation
/// errors with the operation's own message instead of extractor rejections.
/// The nullable columns keep absent (`None`) apart from an explicit `null`
/// (`Some(None)`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookPayload {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub id: Option<i64>,
    #[serde(default)]
    pub nombre: Option<String>,
    #[serde(default)]
    pub autor: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub categoria: Option<Option<String>>,
    #[serde(
        rename = "año-publicacion",
        default,
        deserialize_with = "nullable_lenient_i32"
    )]
    pub anio_publicacion: Option<Option<i32>>,
    #[serde(rename = "ISBN", default, deserialize_with = "lenient_text")]
    pub isbn: Option<String>,
}

/// Body of `DELETE /libros/{id}`; only the id is read, anything else is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteBody {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub id: Option<i64>,
}

/// Validated input for an insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub nombre: String,
    pub autor: String,
    pub categoria: Option<String>,
    pub anio_publicacion: Option<i32>,
    pub isbn: String,
}

/// Validated input for an update; `None` keeps the stored value and
/// `Some(None)` clears a nullable column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookChanges {
    pub nombre: Option<String>,
    pub autor: Option<String>,
    pub categoria: Option<Option<String>>,
    pub anio_publicacion: Option<Option<i32>>,
    pub isbn: String,
}

/// Storage report for a successful insert statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertOutcome {
    pub affected_rows: u64,
    pub id: i64,
}

/// JSON clients send numbers either bare or quoted.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(i64),
    Text(String),
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Number(value)) => Ok(Some(value)),
        Some(NumberOrText::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            text.parse()
                .map(Some)
                .map_err(|_| de::Error::custom(format!("'{text}' is not an integer")))
        }
    }
}

fn lenient_i32<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_i64(deserializer)?
        .map(|value| {
            i32::try_from(value).map_err(|_| de::Error::custom(format!("{value} is out of range")))
        })
        .transpose()
}

/// Only called when the key is present, so `null` becomes `Some(None)`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn nullable_lenient_i32<'de, D>(deserializer: D) -> Result<Option<Option<i32>>, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_i32(deserializer).map(Some)
}

/// A numeric ISBN is kept as its decimal text.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<NumberOrText>::deserialize(deserializer)? {
        None => None,
        Some(NumberOrText::Number(value)) => Some(value.to_string()),
        Some(NumberOrText::Text(text)) => Some(text),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn book_serializes_with_column_names() {
        let book = Book {
            id: 7,
            nombre: "Dune".to_string(),
            autor: "Herbert".to_string(),
            categoria: Some("SciFi".to_string()),
            anio_publicacion: Some(1965),
            isbn: "9780441013593".to_string(),
        };

        assert_eq!(
            serde_json::to_value(&book).unwrap(),
            json!({
                "id": 7,
                "nombre": "Dune",
                "autor": "Herbert",
                "categoria": "SciFi",
                "año-publicacion": 1965,
                "ISBN": "9780441013593"
            })
        );
    }

    #[test]
    fn payload_accepts_quoted_numbers() {
        let payload: BookPayload = serde_json::from_value(json!({
            "id": "12",
            "año-publicacion": "1965",
            "ISBN": "9780441013593"
        }))
        .unwrap();

        assert_eq!(payload.id, Some(12));
        assert_eq!(payload.anio_publicacion, Some(Some(1965)));
        assert_eq!(payload.isbn.as_deref(), Some("9780441013593"));
        assert!(payload.nombre.is_none());
    }

    #[test]
    fn payload_tells_null_apart_from_absent() {
        let cleared: BookPayload = serde_json::from_value(json!({
            "categoria": null,
            "año-publicacion": null
        }))
        .unwrap();
        assert_eq!(cleared.categoria, Some(None));
        assert_eq!(cleared.anio_publicacion, Some(None));

        let omitted: BookPayload = serde_json::from_value(json!({})).unwrap();
        assert_eq!(omitted.categoria, None);
        assert_eq!(omitted.anio_publicacion, None);
    }

    #[test]
    fn numeric_isbn_is_read_as_text() {
        let payload: BookPayload =
            serde_json::from_value(json!({ "ISBN": 9780141439587i64 })).unwrap();
        assert_eq!(payload.isbn.as_deref(), Some("9780141439587"));
    }

    #[test]
    fn delete_body_ignores_unrelated_fields() {
        let body: DeleteBody = serde_json::from_value(json!({
            "id": 4,
            "año-publicacion": "desconocido",
            "ISBN": []
        }))
        .unwrap();
        assert_eq!(body.id, Some(4));
        assert!(serde_json::from_value::<DeleteBody>(json!({ "id": "cuatro" })).is_err());
    }

    #[test]
    fn payload_treats_blank_and_null_ids_as_missing() {
        let blank: BookPayload = serde_json::from_value(json!({ "id": " " })).unwrap();
        let null: BookPayload = serde_json::from_value(json!({ "id": null })).unwrap();
        let empty: BookPayload = serde_json::from_value(json!({})).unwrap();

        assert_eq!(blank.id, None);
        assert_eq!(null.id, None);
        assert_eq!(empty.id, None);
    }

    #[test]
    fn payload_rejects_non_numeric_ids_and_years() {
        assert!(serde_json::from_value::<BookPayload>(json!({ "id": "doce" })).is_err());
        assert!(serde_json::from_value::<BookPayload>(json!({ "año-publicacion": 1e12 })).is_err());
        assert!(
            serde_json::from_value::<BookPayload>(json!({ "año-publicacion": 9_999_999_999i64 }))
                .is_err()
        );
    }
}
