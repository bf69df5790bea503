use criterion::{Criterion, black_box, criterion_group, criterion_main};
use webstruct_core::features::{HtmlFeatureExtractor, default_token_features};
use webstruct_core::html::{Dom, HtmlTokenizer, HtmlTokenizerConfig, rewrite_entity_tags};
use webstruct_core::text::{TextTokenizer, WordTokenizer};

const PAGE: &str = "<html><body>\
    <h1>Contact us</h1>\
    <div class=\"office\"><p><ORG>Acme Ltd</ORG></p>\
    <p><STREET>12 Main St.</STREET>, <CITY>Dublin</CITY> <ZIPCODE>D02 X285</ZIPCODE></p>\
    <p>Tel: <TEL>+353 1 555 1234</TEL> Fax: <FAX>+353 1 555 1235</FAX></p>\
    <p>Email: <EMAIL>info@acme.ie</EMAIL></p></div>\
    <p>Opening hours: Mon - Fri 9:00 - 17:30, closed on weekends.</p>\
    </body></html>";

fn bench_text_tokenizer(c: &mut Criterion) {
    let tokenizer = WordTokenizer::new().unwrap();
    let text = "Good muffins cost $3.88\nin New York.  Please buy me\ntwo of them.\n\nThanks.";

    c.bench_function("word_tokenize", |b| {
        b.iter(|| tokenizer.tokenize(black_box(text)).count());
    });
}

fn bench_html_tokenizer(c: &mut Criterion) {
    let html = rewrite_entity_tags(
        PAGE,
        &["ORG", "STREET", "CITY", "ZIPCODE", "TEL", "FAX", "EMAIL"],
    )
    .unwrap();
    let dom = Dom::parse_document(&html);
    let tokenizer = HtmlTokenizer::new(HtmlTokenizerConfig::default()).unwrap();

    c.bench_function("html_tokenize_single", |b| {
        b.iter(|| tokenizer.tokenize_single(black_box(&dom)).unwrap());
    });

    let (tokens, tags) = tokenizer.tokenize_single(&dom).unwrap();
    c.bench_function("html_detokenize_single", |b| {
        b.iter(|| tokenizer.detokenize_single(black_box(&tokens), black_box(&tags)).unwrap());
    });
}

fn bench_feature_extraction(c: &mut Criterion) {
    let tokenizer = HtmlTokenizer::new(HtmlTokenizerConfig::default()).unwrap();
    let (tokens, _) = tokenizer.tokenize_single(&Dom::parse_document(PAGE)).unwrap();
    let extractor = HtmlFeatureExtractor::new(default_token_features().unwrap());

    c.bench_function("features_transform_single", |b| {
        b.iter(|| extractor.transform_single(black_box(&tokens)));
    });

    let corpus = vec![tokens; 16];
    c.bench_function("features_transform_16_docs", |b| {
        b.iter(|| extractor.transform(black_box(&corpus)));
    });
}

criterion_group!(
    benches,
    bench_text_tokenizer,
    bench_html_tokenizer,
    bench_feature_extraction
);
criterion_main!(benches);
