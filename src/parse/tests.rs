use std::collections::BTreeSet;

use super::classify::LineEvent;
use super::*;
use crate::model::Answer;

fn paragraphs(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|line| line.to_string()).collect()
}

fn slides(values: &[u32]) -> BTreeSet<u32> {
    values.iter().copied().collect()
}

fn parse(lines: &[&str]) -> Result<QuizDocument, QuizError> {
    DocumentParser::new(true)
        .expect("parser")
        .parse("network", &paragraphs(lines))
}

fn classifier() -> LineClassifier {
    LineClassifier::new().expect("classifier")
}

#[test]
fn normalizer_folds_typographic_punctuation_and_whitespace() {
    let normalizer = TextNormalizer::default();
    assert_eq!(
        normalizer.normalize("  \u{201C}Cavo\u{201D}\t \u{2013} rete  \u{2019}x\u{2019} "),
        "\"Cavo\" - rete 'x'"
    );
}

#[test]
fn normalizer_repairs_trailing_apostrophe_accents() {
    let normalizer = TextNormalizer::default();
    assert_eq!(normalizer.normalize("perche' la citta'?"), "perchè la città?");
    assert_eq!(normalizer.normalize("c'e' PERCHE'"), "c'è PERCHÈ");
    assert_eq!(
        normalizer.normalize("dell'impianto e l'altro"),
        "dell'impianto e l'altro"
    );
    assert_eq!(normalizer.normalize("la parola 'casa'"), "la parola 'casa'");
}

#[test]
fn normalizer_can_skip_accent_repair() {
    let normalizer = TextNormalizer::new(false);
    assert_eq!(normalizer.normalize("perche'  no"), "perche' no");
}

#[test]
fn classifier_recognizes_headers_with_optional_ordinals_and_durations() {
    let classifier = classifier();
    assert_eq!(
        classifier.classify("UF. Safety (40)"),
        Ok(LineEvent::UnitHeader {
            name: "Safety".to_string(),
            duration: Some(40.0),
        })
    );
    assert_eq!(
        classifier.classify("UF 2 - Reti locali (12,5 ore)"),
        Ok(LineEvent::UnitHeader {
            name: "Reti locali".to_string(),
            duration: Some(12.5),
        })
    );
    assert_eq!(
        classifier.classify("Modulo - Cabling (5)"),
        Ok(LineEvent::ModuleHeader {
            name: "Cabling".to_string(),
            duration: Some(5.0),
        })
    );
    assert_eq!(
        classifier.classify("Modulo 3: Routing"),
        Ok(LineEvent::ModuleHeader {
            name: "Routing".to_string(),
            duration: None,
        })
    );
}

#[test]
fn classifier_rejects_headers_without_a_name() {
    let classifier = classifier();
    let unit = classifier.classify("UF -").expect_err("no name");
    assert_eq!(unit.reason, "unit header without a name");
    let module = classifier.classify("Modulo:").expect_err("no name");
    assert_eq!(module.reason, "module header without a name");
}

#[test]
fn keyword_prefix_inside_a_word_is_not_a_header() {
    let classifier = classifier();
    assert!(!matches!(
        classifier.classify("Ufficio tecnico slide 4"),
        Ok(LineEvent::UnitHeader { .. })
    ));
    assert!(!matches!(
        classifier.classify("Modulazione del segnale slide 4"),
        Ok(LineEvent::ModuleHeader { .. })
    ));
}

#[test]
fn classifier_splits_question_prompt_from_slide_clause() {
    assert_eq!(
        classifier().classify("How are cables terminated? slide 12"),
        Ok(LineEvent::QuestionLine {
            prompt: "How are cables terminated?".to_string(),
            slides: slides(&[12]),
        })
    );
    assert_eq!(
        classifier().classify("Which layer routes packets? (slides 4-6)"),
        Ok(LineEvent::QuestionLine {
            prompt: "Which layer routes packets?".to_string(),
            slides: slides(&[4, 6]),
        })
    );
}

#[test]
fn slide_mention_inside_the_prompt_is_skipped() {
    assert_eq!(
        classifier().classify("Refer to slide 3 of the deck. slide 5"),
        Ok(LineEvent::QuestionLine {
            prompt: "Refer to slide 3 of the deck.".to_string(),
            slides: slides(&[5]),
        })
    );
}

#[test]
fn closing_punctuation_after_the_slide_clause_ends_the_question() {
    for line in [
        "Which cable is shielded? slide 12.",
        "Which cable is shielded? (slide 12).",
        "Which cable is shielded? slide 12;",
    ] {
        assert_eq!(
            classifier().classify(line),
            Ok(LineEvent::QuestionLine {
                prompt: "Which cable is shielded?".to_string(),
                slides: slides(&[12]),
            }),
            "{line}"
        );
    }
}

#[test]
fn classifier_reads_answer_triples_and_the_correct_marker() {
    assert_eq!(
        classifier().classify("a. Crimped b. ok Soldered c. Taped"),
        Ok(LineEvent::AnswerLine {
            answers: vec![
                Answer::new("Crimped", false),
                Answer::new("Soldered", true),
                Answer::new("Taped", false),
            ],
        })
    );
    assert_eq!(
        classifier().classify("b) OK - Soldered"),
        Ok(LineEvent::AnswerLine {
            answers: vec![Answer::new("Soldered", true)],
        })
    );
}

#[test]
fn combined_line_carries_question_and_answers() {
    assert_eq!(
        classifier().classify("What joins two cables? slide 7 a. Splice b. ok Crimp c. Tape"),
        Ok(LineEvent::CombinedQuestionAnswer {
            prompt: "What joins two cables?".to_string(),
            slides: slides(&[7]),
            answers: vec![
                Answer::new("Splice", false),
                Answer::new("Crimp", true),
                Answer::new("Tape", false),
            ],
        })
    );
}

#[test]
fn separator_between_slide_clause_and_answers_is_skipped() {
    assert_eq!(
        classifier().classify("Which cable is shielded? slide 12 - a. UTP b. ok STP c. Coax"),
        Ok(LineEvent::CombinedQuestionAnswer {
            prompt: "Which cable is shielded?".to_string(),
            slides: slides(&[12]),
            answers: vec![
                Answer::new("UTP", false),
                Answer::new("STP", true),
                Answer::new("Coax", false),
            ],
        })
    );
}

#[test]
fn lettered_answer_accepts_colon_and_dash_separators() {
    for line in ["a - Crimped", "a: Crimped", "A) Crimped"] {
        assert_eq!(
            classifier().classify(line),
            Ok(LineEvent::AnswerLine {
                answers: vec![Answer::new("Crimped", false)],
            }),
            "{line}"
        );
    }
}

#[test]
fn hyphenated_words_do_not_split_an_answer_triple() {
    assert_eq!(
        classifier().classify("a. Use a b-tree b. ok Heap c. List"),
        Ok(LineEvent::AnswerLine {
            answers: vec![
                Answer::new("Use a b-tree", false),
                Answer::new("Heap", true),
                Answer::new("List", false),
            ],
        })
    );
    assert_eq!(
        classifier().classify("a - Copper b - ok Fiber c - Radio"),
        Ok(LineEvent::AnswerLine {
            answers: vec![
                Answer::new("Copper", false),
                Answer::new("Fiber", true),
                Answer::new("Radio", false),
            ],
        })
    );
}

#[test]
fn classifier_reads_standalone_jump_annotations() {
    assert_eq!(
        classifier().classify("Slides: 4, 6"),
        Ok(LineEvent::JumpAnnotation {
            slides: slides(&[4, 6]),
        })
    );
    assert_eq!(
        classifier().classify("** slide 9 **"),
        Ok(LineEvent::JumpAnnotation {
            slides: slides(&[9]),
        })
    );
}

#[test]
fn classifier_accepts_older_question_and_answer_keywords() {
    let classifier = classifier();
    assert_eq!(
        classifier.classify("Domanda 1: What is a switch?"),
        Ok(LineEvent::QuestionLine {
            prompt: "What is a switch?".to_string(),
            slides: BTreeSet::new(),
        })
    );
    assert_eq!(
        classifier.classify("Risposta ok - A layer 2 device"),
        Ok(LineEvent::AnswerLine {
            answers: vec![Answer::new("A layer 2 device", true)],
        })
    );
    assert_eq!(
        classifier.classify("Risposta 2 - A router"),
        Ok(LineEvent::AnswerLine {
            answers: vec![Answer::new("A router", false)],
        })
    );
}

#[test]
fn blank_lines_are_ignorable_and_noise_is_unrecognized() {
    let classifier = classifier();
    assert_eq!(classifier.classify("   "), Ok(LineEvent::Ignorable));
    let unrecognized = classifier
        .classify("This line means nothing")
        .expect_err("noise");
    assert_eq!(
        unrecognized.reason,
        "line is neither a header, a question nor an answer"
    );
}

#[test]
fn well_formed_document_builds_the_expected_tree() {
    let document = parse(&[
        "UF. Network (10)",
        "Modulo - Cabling (5)",
        "How are cables terminated? slide 12",
        "a. Crimped b. ok Soldered c. Taped",
    ])
    .expect("document");

    assert_eq!(document.units.len(), 1);
    let unit = &document.units[0];
    assert_eq!(unit.name, "Network");
    assert_eq!(unit.duration, Some(10.0));

    let module = &unit.modules[0];
    assert_eq!(module.name, "Cabling");
    assert_eq!(module.duration, Some(5.0));

    let question = &module.questions[0];
    assert_eq!(question.prompt, "How are cables terminated?");
    assert_eq!(question.slides, slides(&[12]));
    assert_eq!(
        question.answers,
        vec![
            Answer::new("Crimped", false),
            Answer::new("Soldered", true),
            Answer::new("Taped", false),
        ]
    );

    assert!(crate::validate::validate(&document).is_ok());
}

#[test]
fn document_without_correct_answer_fails_validation_at_the_question() {
    let document = parse(&[
        "UF. Network (10)",
        "Modulo - Cabling (5)",
        "How are cables terminated? slide 12",
        "a. Crimped b. Soldered c. Taped",
    ])
    .expect("document");

    match crate::validate::validate(&document) {
        Err(QuizError::Validation { message, location }) => {
            assert_eq!(message, "No correct answer found");
            assert_eq!(location, "uf: 1, module: 1, question: 1 / global question: 1");
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
}

#[test]
fn answer_before_any_question_is_a_structural_error() {
    let err = parse(&[
        "UF. Network (10)",
        "Modulo - Cabling (5)",
        "a. Crimped b. ok Soldered c. Taped",
    ])
    .expect_err("answer without question");

    match err {
        QuizError::StructuralOrder { paragraph, message } => {
            assert_eq!(paragraph, 3);
            assert_eq!(message, "Found answer without question");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn combined_line_closes_its_question() {
    let err = parse(&[
        "UF. Network (10)",
        "Modulo - Cabling (5)",
        "What joins two cables? slide 7 a. Splice b. ok Crimp c. Tape",
        "a. Crimped b. ok Soldered c. Taped",
    ])
    .expect_err("stray answers");
    assert_eq!(err.kind(), "structural_order_violation");
}

#[test]
fn module_and_question_need_their_parents() {
    let err = parse(&["Modulo - Cabling (5)"]).expect_err("module without unit");
    assert!(err.to_string().contains("Found module without unit"));

    let err = parse(&["UF. Network (10)", "How are cables terminated? slide 12"])
        .expect_err("question without module");
    assert!(err.to_string().contains("Found question without module"));
}

#[test]
fn unrecognized_paragraph_reports_its_position() {
    let err = parse(&["UF. Network (10)", "", "This line means nothing"])
        .expect_err("noise");
    match err {
        QuizError::Recognition { paragraph, text, .. } => {
            assert_eq!(paragraph, 3);
            assert_eq!(text, "This line means nothing");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn counters_reset_per_container_and_global_index_keeps_counting() {
    let document = parse(&[
        "UF 1 - Network (10)",
        "Modulo 1 - Cabling (5)",
        "First? slide 1",
        "a. x b. ok y c. z",
        "Second? slide 2",
        "a. x b. ok y c. z",
        "Modulo 2 - Routing (5)",
        "Third? slide 3",
        "a. x b. ok y c. z",
        "UF 2 - Security (8)",
        "Modulo 1 - Firewalls (8)",
        "Fourth? slide 4",
        "a. x b. ok y c. z",
    ])
    .expect("document");

    let questions = document
        .modules()
        .flat_map(|module| module.questions.iter())
        .map(|question| {
            (
                question.unit_index,
                question.module_index,
                question.index,
                question.global_index,
            )
        })
        .collect::<Vec<_>>();
    assert_eq!(
        questions,
        vec![(0, 0, 0, 0), (0, 0, 1, 1), (0, 1, 0, 2), (1, 0, 0, 3)]
    );
    assert_eq!(document.units[1].modules[0].index, 0);
}

#[test]
fn sort_order_is_stable_by_minimum_slide() {
    let document = parse(&[
        "UF. Network (10)",
        "Modulo - Cabling (5)",
        "Late? slide 9",
        "a. x b. ok y c. z",
        "Middle? slides 3, 12",
        "a. x b. ok y c. z",
        "Middle again? slide 3",
        "a. x b. ok y c. z",
        "Early? slide 1",
        "a. x b. ok y c. z",
    ])
    .expect("document");

    let module = &document.units[0].modules[0];
    assert_eq!(module.sort_order, vec![3, 1, 2, 0]);
    let prompts = module
        .ordered_questions()
        .iter()
        .map(|question| question.prompt.as_str())
        .collect::<Vec<_>>();
    assert_eq!(prompts, vec!["Early?", "Middle?", "Middle again?", "Late?"]);
}

#[test]
fn older_layout_takes_the_slide_from_a_trailing_line() {
    let document = parse(&[
        "UF. Network (10)",
        "Modulo - Cabling (5)",
        "Domanda 1: What is a switch?",
        "Risposta - A hub",
        "Risposta ok - A layer 2 device",
        "Risposta - A cable",
        "slide 14",
    ])
    .expect("document");

    let question = &document.units[0].modules[0].questions[0];
    assert_eq!(question.slides, slides(&[14]));
    assert_eq!(question.correct_count(), 1);
    assert!(crate::validate::validate(&document).is_ok());
}

#[test]
fn second_jump_annotation_is_rejected() {
    let err = parse(&[
        "UF. Network (10)",
        "Modulo - Cabling (5)",
        "How are cables terminated? slide 12",
        "slide 13",
    ])
    .expect_err("second jump");
    assert_eq!(err.kind(), "structural_order_violation");
}

#[test]
fn question_that_never_gets_a_slide_fails_at_the_end_of_the_pass() {
    let err = parse(&[
        "UF. Network (10)",
        "Modulo - Cabling (5)",
        "Domanda: What is a switch?",
        "a. x b. ok y c. z",
    ])
    .expect_err("missing slide");
    match err {
        QuizError::Validation { message, location } => {
            assert_eq!(message, "No jump to slide found");
            assert_eq!(location, "uf: 1, module: 1, question: 1 / global question: 1");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn builder_can_be_driven_event_by_event() {
    let events = vec![
        Ok(LineEvent::UnitHeader {
            name: "Network".to_string(),
            duration: None,
        }),
        Ok(LineEvent::Ignorable),
        Ok(LineEvent::JumpAnnotation {
            slides: slides(&[2]),
        }),
    ];
    let err = build("network", events).expect_err("jump without question");
    assert!(matches!(
        err,
        QuizError::StructuralOrder { paragraph: 3, .. }
    ));
}

#[test]
fn module_name_keeps_a_part_number_before_the_duration() {
    let document = parse(&[
        "UF. Safety (40)",
        "Modulo - Sicurezza (parte 1) (8)",
        "What does PPE stand for? slide 2",
        "a. Nothing b. ok Personal protective equipment c. A form",
    ])
    .expect("document");

    let module = &document.units[0].modules[0];
    assert_eq!(module.duration, Some(8.0));
    assert_eq!(module.display_name(), "Sicurezza (parte 1)");
}
