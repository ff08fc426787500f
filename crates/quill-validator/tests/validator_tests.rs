//! Integration tests for the validation engine.

use quill_markup::{Document, PlaceholderRegistry};
use quill_validator::{
    FindingCode, Format, Severity, SpecRepository, ValidationFinding, ValidationOptions,
    ValidationReport, Validator,
};

const CANONICAL: &str = r#"<link rel="canonical" href="https://example.com/">"#;

/// Helper to wrap head and body markup in an otherwise valid AMP page
fn amp_document(head: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html amp><head>\
         <meta charset=\"utf-8\">\
         <script async src=\"https://cdn.ampproject.org/v0.js\"></script>\
         <title>Quill</title>\
         {CANONICAL}\
         <meta name=\"viewport\" content=\"width=device-width\">\
         <style amp-boilerplate>body{{-webkit-animation:-amp-start 8s steps(1,end) 0s 1 normal both;animation:-amp-start 8s steps(1,end) 0s 1 normal both}}</style>\
         <noscript><style amp-boilerplate>body{{-webkit-animation:none;-moz-animation:none;-ms-animation:none;animation:none}}</style></noscript>\
         {head}</head><body>{body}</body></html>"
    )
}

/// Helper to build a bare document around head and body markup
fn page(head: &str, body: &str) -> String {
    format!("<!DOCTYPE html><html><head>{head}</head><body>{body}</body></html>")
}

fn parse(html: &str) -> Document {
    match Document::parse_with_registry(html, PlaceholderRegistry::with_salt("validator-tests")) {
        Ok(doc) => doc,
        Err(e) => panic!("document failed to parse: {e}"),
    }
}

fn fragment(content: &str) -> Document {
    match Document::from_fragment_with_registry(
        content,
        "utf-8",
        PlaceholderRegistry::with_salt("validator-tests"),
    ) {
        Ok(doc) => doc,
        Err(e) => panic!("fragment failed to parse: {e}"),
    }
}

fn validate_with(doc: &Document, options: ValidationOptions) -> ValidationReport {
    match Validator::builtin(options) {
        Ok(validator) => validator.validate(doc),
        Err(e) => panic!("built-in rules failed to load: {e}"),
    }
}

fn validate(doc: &Document) -> ValidationReport {
    validate_with(doc, ValidationOptions::default())
}

fn without_extensions(doc: &Document) -> ValidationReport {
    validate_with(doc, ValidationOptions::default().without_extension_checks())
}

fn codes(report: &ValidationReport) -> Vec<FindingCode> {
    report.findings.iter().map(|f| f.code).collect()
}

fn only(report: &ValidationReport) -> &ValidationFinding {
    match report.findings.as_slice() {
        [finding] => finding,
        findings => panic!("expected exactly one finding, got {findings:#?}"),
    }
}

#[test]
fn test_valid_amp_document() {
    let doc = parse(&amp_document("", "<p>Hello <em>world</em></p>"));
    let report = validate_with(&doc, ValidationOptions::default().with_format(Format::Amp));
    assert_eq!(report.findings, Vec::new());
    assert!(report.is_valid());
}

#[test]
fn test_missing_mandatory_tag_needs_a_format() {
    let html = amp_document("", "<p>x</p>").replace(CANONICAL, "");
    let doc = parse(&html);

    let report = validate_with(&doc, ValidationOptions::default().with_format(Format::Amp));
    let finding = only(&report);
    assert_eq!(finding.code, FindingCode::MandatoryTagMissing);
    assert_eq!(finding.spec_name, "link rel=canonical");
    assert_eq!(finding.path, "");
    assert_eq!(finding.node, None);

    assert!(validate(&doc).findings.is_empty());
}

#[test]
fn test_disallowed_tag() {
    let doc = fragment("<p>a</p><img src=\"x.png\">");
    let finding = only(&validate(&doc)).clone();
    assert_eq!(finding.code, FindingCode::DisallowedTag);
    assert_eq!(finding.spec_name, "img");
    assert_eq!(finding.path, "html > body > img");
    assert_eq!(finding.severity, Severity::Error);
}

#[test]
fn test_format_filters_candidates() {
    let doc = fragment("<amp-audio src=\"https://example.com/a.mp3\"></amp-audio>");
    let options = ValidationOptions::default().without_extension_checks();
    assert!(validate_with(&doc, options).findings.is_empty());
    let report = validate_with(&doc, options.with_format(Format::Amp4email));
    assert_eq!(
        codes(&report)
            .into_iter()
            .filter(|&c| c == FindingCode::DisallowedTag)
            .count(),
        1
    );
}

#[test]
fn test_amp4ads_boilerplate_dispatches_by_parent() {
    let doc = parse(&page(
        "<style amp4ads-boilerplate>body{visibility:hidden}</style>",
        "",
    ));
    let report = validate(&doc);
    assert_eq!(report.with_code(FindingCode::MandatoryAttributeMissing).count(), 0);
    assert!(report.findings.is_empty());
}

#[test]
fn test_boilerplate_content_must_match() {
    let doc = parse(&page(
        "<style amp4ads-boilerplate>body{visibility:visible}</style>",
        "",
    ));
    let finding = only(&validate(&doc)).clone();
    assert_eq!(finding.code, FindingCode::CdataMismatch);
    assert_eq!(finding.spec_name, "head > style[amp4ads-boilerplate]");
}

#[test]
fn test_mandatory_ancestor() {
    let report = validate(&fragment("<solidcolor></solidcolor>"));
    let finding = only(&report);
    assert_eq!(finding.code, FindingCode::MandatoryAncestorMissing);
    assert_eq!(finding.spec_name, "solidcolor");

    let report = validate(&fragment(
        r#"<svg viewbox="0 0 1 1"><solidcolor solid-color="red"></solidcolor></svg>"#,
    ));
    assert!(report.findings.is_empty());
}

#[test]
fn test_wrong_parent() {
    let doc = fragment(r#"<meta name="viewport" content="width=device-width">"#);
    let finding = only(&validate(&doc)).clone();
    assert_eq!(finding.code, FindingCode::WrongParentTag);
    assert_eq!(finding.spec_name, "meta name=viewport");
    assert_eq!(finding.path, "html > body > meta");
}

#[test]
fn test_mandatory_parent_by_spec_name() {
    let script = r#"<script ciphertext type="application/octet-stream">c2VjcmV0</script>"#;
    let inside = fragment(&format!(
        r#"<section subscriptions-section="content" swg_amp_cache_nonce="n">{script}</section>"#
    ));
    assert!(without_extensions(&inside).findings.is_empty());

    let outside = fragment(&format!("<section>{script}</section>"));
    let finding = only(&without_extensions(&outside)).clone();
    assert_eq!(finding.code, FindingCode::WrongParentTag);
    assert_eq!(finding.spec_name, "subscriptions script ciphertext");
}

#[test]
fn test_https_only_url() {
    let notification = |href: &str| {
        fragment(&format!(
            r#"<amp-user-notification id="n" layout="nodisplay" data-dismiss-href="{href}"></amp-user-notification>"#
        ))
    };

    let report = without_extensions(&notification("http://example.com"));
    let finding = only(&report);
    assert_eq!(finding.code, FindingCode::DisallowedProtocol);
    assert_eq!(finding.attribute.as_deref(), Some("data-dismiss-href"));

    assert!(without_extensions(&notification("https://example.com")).findings.is_empty());
    assert_eq!(
        codes(&without_extensions(&notification(""))),
        [FindingCode::MissingUrl]
    );
    assert_eq!(
        codes(&without_extensions(&notification("/dismiss"))),
        [FindingCode::DisallowedRelativeUrl]
    );
    assert_eq!(
        codes(&without_extensions(&notification("https://exa mple.com"))),
        [FindingCode::InvalidUrl]
    );
}

#[test]
fn test_exact_values_and_templates() {
    let report = validate(&fragment(r#"<a href="/x" target="_parent">x</a>"#));
    let finding = only(&report);
    assert_eq!(finding.code, FindingCode::InvalidAttributeValue);
    assert_eq!(finding.attribute.as_deref(), Some("target"));

    assert!(validate(&fragment(r#"<a href="/x" target="_BLANK">x</a>"#)).findings.is_empty());
    assert!(validate(&fragment(r#"<a href="{{url}}" target="{{t}}">x</a>"#)).findings.is_empty());
}

#[test]
fn test_global_attributes() {
    let doc = fragment(r#"<p class="a" id="b" data-x="1" aria-label="l">x</p>"#);
    assert!(validate(&doc).findings.is_empty());

    let strict = validate_with(&doc, ValidationOptions::default().with_strict_attributes());
    assert_eq!(strict.with_code(FindingCode::DisallowedAttribute).count(), 4);

    let report = validate(&fragment(r#"<p bogus="1">x</p>"#));
    let finding = only(&report);
    assert_eq!(finding.code, FindingCode::DisallowedAttribute);
    assert_eq!(finding.attribute.as_deref(), Some("bogus"));
}

#[test]
fn test_binding_attributes_follow_their_target() {
    let doc = fragment(
        r#"<amp-img src="a.png" [src]="img.url" layout="fill" [width]="w" [class]="c" [bogus]="b"></amp-img>"#,
    );
    let report = without_extensions(&doc);
    let finding = only(&report);
    assert_eq!(finding.code, FindingCode::DisallowedAttribute);
    assert_eq!(finding.attribute.as_deref(), Some("[bogus]"));
}

#[test]
fn test_declared_binding_attribute() {
    let doc = fragment(
        r#"<amp-audio src="https://example.com/a.mp3"><track kind="subtitles" src="https://example.com/s.vtt" srclang="en" [srclang]="lang"></amp-audio>"#,
    );
    assert!(without_extensions(&doc).findings.is_empty());
}

#[test]
fn test_layout() {
    let report = without_extensions(&fragment(r#"<amp-img src="a.png" layout="container"></amp-img>"#));
    assert_eq!(codes(&report), [FindingCode::UnsupportedLayout]);

    let report = without_extensions(&fragment(r#"<amp-img src="a.png" layout="sideways"></amp-img>"#));
    assert_eq!(codes(&report), [FindingCode::InvalidLayout]);

    let report = without_extensions(&fragment(
        r#"<amp-img src="a.png" layout="responsive" width="4" height="3"></amp-img>"#,
    ));
    assert!(report.findings.is_empty());

    let report = without_extensions(&fragment(r#"<p layout="fill">x</p>"#));
    assert_eq!(codes(&report), [FindingCode::DisallowedAttribute]);
}

#[test]
fn test_unique_tag() {
    let onetap = r#"<amp-onetap-google data-src="https://example.com/1" layout="nodisplay"></amp-onetap-google>"#;
    let report = without_extensions(&fragment(&format!("{onetap}{onetap}")));
    let finding = only(&report);
    assert_eq!(finding.code, FindingCode::DuplicateUniqueTag);
    assert_eq!(finding.path, "html > body > amp-onetap-google:nth-child(2)");
}

#[test]
fn test_required_extension_missing() {
    let doc = parse(&page("", r#"<amp-list src="https://example.com/data.json" layout="fill"></amp-list>"#));
    let report = validate(&doc);
    let finding = only(&report);
    assert_eq!(finding.code, FindingCode::MissingExtension);
    assert_eq!(finding.spec_name, "amp-list");
    assert!(finding.message.contains("'amp-list' extension"));
}

#[test]
fn test_required_extension_present() {
    let loader = r#"<script async custom-element="amp-list" src="https://cdn.ampproject.org/v0/amp-list-0.1.js"></script>"#;
    let body = r#"<amp-list src="https://example.com/data.json" layout="fill"></amp-list>"#;
    assert!(validate(&parse(&page(loader, body))).findings.is_empty());

    let report = validate(&parse(&page(&format!("{loader}{loader}"), body)));
    let finding = only(&report);
    assert_eq!(finding.code, FindingCode::DuplicateExtension);
    assert!(finding.node.is_some());
}

#[test]
fn test_unused_extension_is_a_warning() {
    let loader = r#"<script async custom-element="amp-bind" src="https://cdn.ampproject.org/v0/amp-bind-0.1.js"></script>"#;
    let report = validate(&parse(&page(loader, "<p>x</p>")));
    let finding = only(&report);
    assert_eq!(finding.code, FindingCode::UnusedExtension);
    assert_eq!(finding.severity, Severity::Warning);
    assert!(report.is_valid());

    let report = validate(&parse(&page(loader, r#"<p [text]="x">x</p>"#)));
    assert!(report.findings.is_empty());
}

#[test]
fn test_binding_attributes_need_amp_bind() {
    let report = validate(&fragment(r#"<p [text]="x">x</p>"#));
    let finding = only(&report);
    assert_eq!(finding.code, FindingCode::MissingExtension);
    assert!(finding.message.contains("amp-bind"));
}

#[test]
fn test_stylesheet_rules() {
    let css = "@media (min-width: 1px) { p { color: red } } \
               @-webkit-keyframes fade { from { opacity: 0 } } \
               @import url(x.css); \
               .i-amphtml-hidden { display: none }";
    let doc = parse(&page(&format!("<style amp-custom>{css}</style>"), ""));
    let report = validate(&doc);

    let mut found = codes(&report);
    found.sort_by_key(ToString::to_string);
    assert_eq!(found, [FindingCode::DisallowedAtRule, FindingCode::DisallowedCdata]);
    assert!(report.findings.iter().all(|f| f.spec_name == "style amp-custom"));
    let Some(at_rule) = report.with_code(FindingCode::DisallowedAtRule).next() else {
        panic!("no at-rule finding");
    };
    assert!(at_rule.message.contains("@import"));
}

#[test]
fn test_stylesheet_size() {
    let doc = parse(&page("<style amp-custom>p{color:red}</style>", ""));
    assert!(validate(&doc).findings.is_empty());

    let report = validate_with(&doc, ValidationOptions::default().with_max_document_css_bytes(5));
    let finding = only(&report);
    assert_eq!(finding.code, FindingCode::DocumentCssTooLarge);

    let big = "a{}".repeat(30_000);
    let report = validate(&parse(&page(&format!("<style amp-custom>{big}</style>"), "")));
    assert_eq!(
        codes(&report),
        [FindingCode::CdataTooLong, FindingCode::DocumentCssTooLarge]
    );
}

#[test]
fn test_form_divs_pick_the_closest_spec() {
    let doc = fragment(
        r#"<form method="post" action-xhr="https://example.com/submit"><div submit-success template="t"></div></form>"#,
    );
    assert!(without_extensions(&doc).findings.is_empty());

    // Outside a form the plain div and the verify-error div both have one
    // finding; the plain div is declared first.
    let report = without_extensions(&fragment("<div verify-error></div>"));
    let finding = only(&report);
    assert_eq!(finding.code, FindingCode::DisallowedAttribute);
    assert_eq!(finding.spec_name, "div");
}

#[test]
fn test_tie_resolves_to_declaration_order() {
    let rules = r#"{ "tags": [
        { "tag_name": "html" },
        { "tag_name": "head" },
        { "tag_name": "body" },
        { "tag_name": "meta", "attrs": [{ "name": "http-equiv" }, { "name": "content" }] },
        { "tag_name": "div", "spec_name": "needs x", "attrs": [{ "name": "x", "mandatory": true }],
          "requires_extension": ["ext-x"] },
        { "tag_name": "div", "spec_name": "first", "requires_extension": ["ext-first"] },
        { "tag_name": "div", "spec_name": "second", "requires_extension": ["ext-second"] }
    ] }"#;
    let repository = match SpecRepository::from_json(rules) {
        Ok(repository) => repository,
        Err(e) => panic!("rules failed to load: {e}"),
    };
    let validator = Validator::new(&repository, ValidationOptions::default());
    let report = validator.validate(&fragment("<div></div>"));
    let finding = only(&report);
    assert_eq!(finding.code, FindingCode::MissingExtension);
    assert_eq!(finding.spec_name, "first");
}

#[test]
fn test_findings_follow_document_order() {
    let report = validate(&fragment("<blink></blink><p bogus></p><marquee></marquee>"));
    let paths: Vec<&str> = report.findings.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(
        paths,
        ["html > body > blink", "html > body > p", "html > body > marquee"]
    );
}

#[test]
fn test_validator_is_shared_across_threads() {
    let handles: Vec<_> = (0..4)
        .map(|i| {
            std::thread::spawn(move || {
                let doc = Document::from_fragment(&format!("<p [text]=\"v{i}\">x</p><img>"))
                    .map_err(|e| e.to_string())?;
                let validator = Validator::builtin(ValidationOptions::default().without_extension_checks())
                    .map_err(|e| e.to_string())?;
                Ok::<_, String>(validator.validate(&doc).findings.len())
            })
        })
        .collect();
    for handle in handles {
        match handle.join() {
            Ok(Ok(count)) => assert_eq!(count, 1),
            Ok(Err(e)) => panic!("validation failed: {e}"),
            Err(_) => panic!("thread panicked"),
        }
    }
}

#[test]
fn test_report_serializes_to_json() {
    let report = validate(&fragment("<img>"));
    let json = match serde_json::to_value(&report) {
        Ok(json) => json,
        Err(e) => panic!("report did not serialize: {e}"),
    };
    assert_eq!(json["findings"][0]["code"], "DISALLOWED_TAG");
    assert_eq!(json["findings"][0]["path"], "html > body > img");
}
