use qrcode::render::svg;
use qrcode::QrCode;
use url::Url;

#[derive(thiserror::Error, Debug)]
pub enum QrGenerationError {
    #[error("QR code generation failed: {0}")]
    QrCodeError(#[from] qrcode::types::QrError),

    #[error("Invalid scan URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Base URL cannot carry a path")]
    CannotBeBase,
}

/// The URL printed on a sticker: `<base_url>/scan/<code>`.
///
/// Opening it lands on the console's scan dispatch.
pub fn scan_url(base_url: &str, code: &str) -> Result<Url, QrGenerationError> {
    let mut url = Url::parse(base_url)?;
    url.path_segments_mut()
        .map_err(|_| QrGenerationError::CannotBeBase)?
        .pop_if_empty()
        .extend(["scan", code]);
    Ok(url)
}

/// Renders the sticker's scan URL as an SVG QR code
pub fn generate_sticker_svg(base_url: &str, code: &str) -> Result<String, QrGenerationError> {
    let url = scan_url(base_url, code)?;

    let qr = QrCode::new(url.as_str().as_bytes())?;

    let svg = qr
        .render::<svg::Color>()
        .min_dimensions(200, 200)
        .quiet_zone(true)
        .build();

    Ok(svg)
}
