use std::collections::HashMap;

/// Read access to one submitted value of an inbound request.
///
/// The registry only ever asks for its own field
/// (`token_<context name>`), so hosts can expose however little of the
/// request they like.
pub trait RequestValueReader {
    fn form_value(&self, name: &str) -> Option<&str>;
}

impl<R> RequestValueReader for &R
where
    R: RequestValueReader + ?Sized,
{
    fn form_value(&self, name: &str) -> Option<&str> {
        (**self).form_value(name)
    }
}

impl RequestValueReader for HashMap<String, String> {
    fn form_value(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

/// A parsed `application/x-www-form-urlencoded` body.
///
/// Repeated fields keep their submission order; lookups return the first
/// occurrence.
pub struct UrlEncodedForm {
    pairs: Vec<(String, String)>,
}

impl UrlEncodedForm {
    pub fn parse(body: &str) -> Result<Self, serde_urlencoded::de::Error> {
        serde_urlencoded::from_str(body).map(|pairs| Self { pairs })
    }
}

impl RequestValueReader for UrlEncodedForm {
    fn form_value(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }
}
