use super::*;

fn transcript(text: &str) -> Transcript {
    Transcript {
        text: text.to_string(),
        language: "en".to_string(),
        confidence: Some(0.9),
    }
}

fn mapper() -> GlossMapper {
    GlossMapper::new(Arc::new(Lexicon::builtin()))
}

fn labels(sequence: &GlossSequence) -> Vec<&str> {
    sequence.iter().map(|t| t.label()).collect()
}

#[test]
fn test_multiword_phrase_beats_single_words() {
    let sequence = mapper().map(&transcript("turn on the light"));
    assert_eq!(
        sequence,
        vec![GlossToken::sign("TURN-ON"), GlossToken::sign("LIGHT")]
    );
}

#[test]
fn test_stopwords_are_dropped_by_grammar_rule() {
    let sequence = mapper().map(&transcript("I am going to the school"));
    // "am", "to", "the" have no sign; "going" is out of vocabulary.
    assert_eq!(
        labels(&sequence),
        vec!["ME", "GOING", "SCHOOL"]
    );
    assert!(sequence[1].is_fingerspell());
}

#[test]
fn test_unknown_words_fingerspell_instead_of_dropping() {
    let sequence = mapper().map(&transcript("hello zephyr"));
    assert_eq!(
        sequence,
        vec![
            GlossToken::sign("HELLO"),
            GlossToken::Fingerspell {
                letters: "ZEPHYR".to_string()
            }
        ]
    );
}

#[test]
fn test_all_unknown_yields_all_fingerspelled() {
    let sequence = mapper().map(&transcript("xylophone quasar"));
    assert!(sequence.iter().all(GlossToken::is_fingerspell));
    assert_eq!(sequence.len(), 2);
}

#[test]
fn test_time_moves_to_front() {
    let sequence = mapper().map(&transcript("I want water tomorrow"));
    assert_eq!(labels(&sequence), vec!["TOMORROW", "ME", "WANT", "WATER"]);
    assert_eq!(
        sequence[0],
        GlossToken::Sign {
            id: "TOMORROW".to_string(),
            marker: Some(Marker::Future),
        }
    );
}

#[test]
fn test_question_moves_to_end() {
    let sequence = mapper().map(&transcript("where is my water"));
    assert_eq!(labels(&sequence), vec!["MY", "WATER", "WHERE"]);
}

#[test]
fn test_negation_follows_body() {
    let sequence = mapper().map(&transcript("I do not want food"));
    // "do" is unknown -> fingerspelled; NOT moves after the comment body.
    assert_eq!(labels(&sequence), vec!["ME", "DO", "WANT", "FOOD", "NOT"]);
}

#[test]
fn test_mapping_is_deterministic() {
    let t = transcript("turn off the fan tomorrow why");
    let first = mapper().map(&t);
    for _ in 0..10 {
        assert_eq!(mapper().map(&t), first);
    }
}

#[test]
fn test_punctuation_and_case_are_ignored() {
    let plain = mapper().map(&transcript("turn on the light"));
    let noisy = mapper().map(&transcript("  Turn ON, the LIGHT!?  "));
    assert_eq!(plain, noisy);
}

#[test]
fn test_empty_transcript_maps_to_empty_sequence() {
    assert!(mapper().map(&transcript("")).is_empty());
    assert!(mapper().map(&transcript("...")).is_empty());
}

#[test]
fn test_gratitude_detection() {
    assert!(is_gratitude("Thank you!"));
    assert!(is_gratitude("thanks"));
    assert!(is_gratitude("Thank you so much."));
    assert!(is_gratitude("thank you for everything"));
    assert!(!is_gratitude("turn on the light"));
    assert!(!is_gratitude(""));
}

#[test]
fn test_lexicon_from_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lexicon.json");
    std::fs::write(
        &path,
        r#"[
            {"phrase": "switch on", "gloss": "SWITCH-ON"},
            {"phrase": "lamp", "gloss": "LAMP"},
            {"phrase": "the", "gloss": "", "class": "stopword"},
            {"phrase": "later", "gloss": "LATER", "class": "time", "marker": "future"}
        ]"#,
    )
    .unwrap();

    let lexicon = Lexicon::load(&path).unwrap();
    assert_eq!(lexicon.len(), 4);

    let mapper = GlossMapper::new(Arc::new(lexicon));
    let sequence = mapper.map(&transcript("switch on the lamp later"));
    assert_eq!(labels(&sequence), vec!["LATER", "SWITCH-ON", "LAMP"]);
}

#[test]
fn test_lexicon_load_rejects_bad_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{not json").unwrap();
    assert!(Lexicon::load(&path).is_err());
}

#[test]
fn test_later_duplicate_phrase_wins() {
    let lexicon = Lexicon::from_entries([
        LexiconEntry {
            phrase: "light".to_string(),
            gloss: "OLD".to_string(),
            class: WordClass::Plain,
            marker: None,
        },
        LexiconEntry {
            phrase: "light".to_string(),
            gloss: "LIGHT".to_string(),
            class: WordClass::Plain,
            marker: None,
        },
    ]);
    let mapper = GlossMapper::new(Arc::new(lexicon));
    assert_eq!(labels(&mapper.map(&transcript("light"))), vec!["LIGHT"]);
}
