use std::sync::Arc;

use webstruct_core::encoding::{Scheme, Tag, group, parse_tags};
use webstruct_core::features::{
    DocumentBorders, GlobalFeatureRef, HtmlFeatureExtractor, LongestMatch, LongestMatchFeature,
    Pattern, default_token_features,
};
use webstruct_core::html::{Dom, HtmlTokenizer, HtmlTokenizerConfig, rewrite_entity_tags};
use webstruct_core::metrics::per_class_metrics;
use webstruct_core::{ClusteringOptions, WebstructError, choose_best_clustering};

const CONTACTS: &str = "<html><body>\
    <h1>Contact</h1>\
    <div><p><ORG>Acme Ltd</ORG></p><p><STREET>12 Main St.</STREET>, <CITY>Dublin</CITY></p>\
    <p>Tel: <TEL>01 555 1234</TEL></p></div>\
    <script>var x = '<b>nope</b>';</script>\
    <p>Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod</p>\
    <div><p><ORG>Acme Paris</ORG></p><p><CITY>Paris</CITY></p>\
    <p>Tel: <TEL>33 1 2345</TEL></p></div>\
    </body></html>";

fn tokenizer(scheme: Scheme) -> HtmlTokenizer {
    let config = HtmlTokenizerConfig::new()
        .with_scheme(scheme)
        .with_replace_tags([("b", "strong")]);
    HtmlTokenizer::new(config).unwrap()
}

fn annotated(html: &str) -> Dom {
    Dom::parse_document(&rewrite_entity_tags(html, &["ORG", "STREET", "CITY", "TEL"]).unwrap())
}

fn strings(tags: &[Tag]) -> Vec<String> {
    tags.iter().map(ToString::to_string).collect()
}

#[test]
fn test_scenario_iob2_and_bilou() {
    let html = "hello, <PER>John <b>Doe</b></PER> <br> <PER>Mary</PER> said";
    let dom = Dom::parse_fragment(&rewrite_entity_tags(html, &["PER"]).unwrap());

    let (tokens, tags) = tokenizer(Scheme::Iob2).tokenize_single(&dom).unwrap();
    let words: Vec<_> = tokens.iter().map(|t| t.token()).collect();
    assert_eq!(words, ["hello", "John", "Doe", "Mary", "said"]);
    assert_eq!(strings(&tags), ["O", "B-PER", "I-PER", "B-PER", "O"]);
    assert_eq!(tokens[2].dom().tag_name(tokens[2].parent()), Some("strong"));

    let (_, tags) = tokenizer(Scheme::Bilou).tokenize_single(&dom).unwrap();
    assert_eq!(strings(&tags), ["O", "B-PER", "L-PER", "U-PER", "O"]);
}

#[test]
fn test_grouping_scenarios() {
    let words = ["hello", ",", "John", "Doe", "Mary", "said"];
    let tags = parse_tags(&["O", "O", "B-PER", "I-PER", "B-PER", "O"]).unwrap();
    let groups = group(words.iter().copied().zip(&tags), false).unwrap();
    let summary: Vec<_> = groups
        .iter()
        .map(|g| (g.items.clone(), g.entity_type.clone()))
        .collect();
    assert_eq!(
        summary,
        [
            (vec!["hello", ","], None),
            (vec!["John", "Doe"], Some("PER".to_string())),
            (vec!["Mary"], Some("PER".to_string())),
            (vec!["said"], None),
        ]
    );

    let bad = parse_tags(&["O", "I-PER", "I-PER"]).unwrap();
    let words = ["hello", "John", "Doe"];
    let repaired = group(words.iter().copied().zip(&bad), false).unwrap();
    assert_eq!(repaired.len(), 2);
    assert_eq!(repaired[1].items, ["John", "Doe"]);
    let err = group(words.iter().copied().zip(&bad), true).unwrap_err();
    assert!(matches!(err, WebstructError::InvalidTagTransition { position: 1, .. }));
}

#[test]
fn test_round_trip() {
    let tokenizer = tokenizer(Scheme::Iob2);
    let dom = annotated(CONTACTS);
    let (tokens, tags) = tokenizer.tokenize_single(&dom).unwrap();
    assert_eq!(tokens.len(), tags.len());
    assert!(tokens.iter().all(|t| t.token() != "nope"));

    let clean = tokenizer.cleanup_tree(&dom);
    let (clean_tokens, clean_tags) = tokenizer.tokenize_single(&clean).unwrap();
    assert!(clean_tags.iter().all(Tag::is_outside));

    let restored = tokenizer
        .detokenize_single(&clean_tokens, &tags)
        .unwrap()
        .unwrap();
    let (restored_tokens, restored_tags) = tokenizer.tokenize_single(&restored).unwrap();
    assert_eq!(restored_tags, tags);
    let words = |ts: &[webstruct_core::HtmlToken]| -> Vec<String> {
        ts.iter().map(|t| t.token().to_string()).collect()
    };
    assert_eq!(words(&restored_tokens), words(&tokens));
    assert_eq!(
        tokenizer.cleanup_tree(&restored).to_html(),
        clean.to_html()
    );
}

#[test]
fn test_features_and_clustering() {
    let tokenizer = tokenizer(Scheme::Iob2);
    let docs = vec![annotated(CONTACTS)];
    let (tokens, tags) = tokenizer.tokenize(&docs).unwrap();

    let cities = Arc::new(LongestMatch::new(["dublin", "paris"]));
    let global_features: Vec<GlobalFeatureRef> = vec![
        Arc::new(Pattern::new(&[(-1, "lower"), (0, "lower")])),
        Arc::new(LongestMatchFeature::new(cities, "gaz_city")),
        Arc::new(DocumentBorders),
    ];
    let extractor = HtmlFeatureExtractor::new(default_token_features().unwrap())
        .with_global_features(global_features);
    let features = extractor.fit_transform(&tokens);
    assert_eq!(features[0].len(), tokens[0].len());

    let dublin = tokens[0].iter().position(|t| t.token() == "Dublin").unwrap();
    assert!(features[0][dublin].contains_key("B-gaz_city"));
    assert_eq!(features[0][dublin].get("lower[-1]/lower").unwrap().to_string(), "st./dublin");
    assert!(features[0][0].contains_key("BOS"));

    let best = choose_best_clustering(
        &tokens[0],
        &tags[0],
        &ClusteringOptions::default(),
    )
    .unwrap();
    let types: Vec<Vec<&str>> = best
        .clusters
        .iter()
        .map(|c| c.iter().map(|e| e.entity_type.as_str()).collect())
        .collect();
    assert_eq!(types, [vec!["ORG", "STREET", "CITY", "TEL"], vec!["ORG", "CITY", "TEL"]]);
}

#[test]
fn test_empty_document() {
    let tokenizer = tokenizer(Scheme::Iob2);
    let (tokens, tags) = tokenizer.tokenize_single(&Dom::parse_fragment("")).unwrap();
    assert!(tokens.is_empty() && tags.is_empty());
    assert!(tokenizer.detokenize_single(&[], &[]).unwrap().is_none());
}

#[test]
fn test_per_class_metrics_on_tokenized_html() {
    let html = "<p>hello, <PER>John <b>Doe</b></PER> <br> <PER>Mary</PER> said </p><CITY>Genova</CITY>";
    let dom = Dom::parse_fragment(&rewrite_entity_tags(html, &["PER", "CITY"]).unwrap());
    let (tokens, tags) = tokenizer(Scheme::Bilou).tokenize_single(&dom).unwrap();
    let words: Vec<&str> = tokens.iter().map(|t| t.token()).collect();
    assert_eq!(words, ["hello", "John", "Doe", "Mary", "said", "Genova"]);

    // the model finds "Mary" and "Genova" but misses "John Doe"
    let predicted = parse_tags(&["O", "O", "O", "U-PER", "O", "U-CITY"]).unwrap();
    let scores = per_class_metrics(&[words.clone()], &[tags], &[words], &[predicted]).unwrap();
    assert_eq!(scores["CITY"].f1, 1.0);
    assert_eq!(scores["PER"].precision, 1.0);
    assert_eq!(scores["PER"].recall, 0.5);
}
