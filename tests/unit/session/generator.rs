use super::*;
use crate::assets::store::ResourceCacheOpts;

fn generator(tag: &str) -> ThumbnailGenerator {
    let root = std::env::temp_dir().join(format!(
        "thumbkit_generator_{tag}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    ThumbnailGenerator::new(Arc::new(ResourceCache::new(ResourceCacheOpts::new(root))))
}

#[test]
fn placeholder_substitution() {
    assert_eq!(substitute_placeholder("Week ^", 3), "Week 3");
    assert_eq!(substitute_placeholder("^/^", 12), "12/12");
    assert_eq!(substitute_placeholder("plain", 1), "plain");
}

#[test]
fn filename_appends_number_without_placeholder() {
    assert_eq!(output_filename("Report^", 7), "Report7");
    assert_eq!(output_filename("output", 7), "output7");
    assert_eq!(output_filename("w^-final", 2), "w2-final");
}

#[test]
fn generate_returns_canvas_and_name() {
    let g = generator("single");
    let style = StyleConfiguration {
        filename_base: "Report^".to_owned(),
        ..StyleConfiguration::default()
    };
    let (canvas, name) = g.generate(&style, "", 7, 64, 32).unwrap();
    assert_eq!(name, "Report7");
    assert_eq!((canvas.width(), canvas.height()), (64, 32));
}

#[test]
fn zero_dimensions_are_rejected() {
    let g = generator("zero");
    let err = g
        .generate(&StyleConfiguration::default(), "x", 1, 0, 10)
        .unwrap_err();
    assert!(matches!(err, ThumbError::Validation(_)));
}

#[test]
fn batch_is_ordered_and_named() {
    let g = generator("batch");
    let mut req = BatchRequest::new("Week ^", 3, 4);
    req.width = 32;
    req.height = 16;
    req.threads = Some(3);

    let out = g
        .generate_batch(&StyleConfiguration::default(), &req)
        .unwrap();
    let names: Vec<_> = out.iter().map(|e| e.filename.as_str()).collect();
    assert_eq!(names, ["output3.png", "output4.png", "output5.png", "output6.png"]);
    let seqs: Vec<_> = out.iter().map(|e| e.sequence).collect();
    assert_eq!(seqs, [3, 4, 5, 6]);
    assert!(out.iter().all(|e| e.png.starts_with(b"\x89PNG")));
}

#[test]
fn batch_filename_template_overrides_style() {
    let g = generator("override");
    let mut req = BatchRequest::new("x", 1, 2);
    req.width = 8;
    req.height = 8;
    req.filename_template = Some("slide-^".to_owned());
    let out = g
        .generate_batch(&StyleConfiguration::default(), &req)
        .unwrap();
    assert_eq!(out[0].filename, "slide-1.png");
    assert_eq!(out[1].filename, "slide-2.png");
}

#[test]
fn zero_threads_is_a_validation_error() {
    let g = generator("threads");
    let mut req = BatchRequest::new("x", 1, 1);
    req.threads = Some(0);
    assert!(matches!(
        g.generate_batch(&StyleConfiguration::default(), &req),
        Err(ThumbError::Validation(_))
    ));
}

#[test]
fn empty_batch_is_empty() {
    let g = generator("empty");
    let req = BatchRequest::new("x", 1, 0);
    assert!(g
        .generate_batch(&StyleConfiguration::default(), &req)
        .unwrap()
        .is_empty());
}

#[test]
fn batch_rejects_filenames_that_leave_the_output_dir() {
    let g = generator("escape");
    for template in ["../x^", "sub/x^", "..\\x^"] {
        let mut req = BatchRequest::new("x", 1, 2);
        req.width = 8;
        req.height = 8;
        req.filename_template = Some(template.to_owned());
        assert!(
            matches!(
                g.generate_batch(&StyleConfiguration::default(), &req),
                Err(ThumbError::Validation(_))
            ),
            "{template}"
        );
    }
    assert!(check_plain_filename("..x7").is_ok());
}

#[test]
fn batch_sequence_past_i64_max_is_rejected() {
    let g = generator("seqmax");
    let mut req = BatchRequest::new("x", i64::MAX - 1, 3);
    req.width = 8;
    req.height = 8;
    assert!(matches!(
        g.generate_batch(&StyleConfiguration::default(), &req),
        Err(ThumbError::Validation(_))
    ));

    req.count = 2;
    let out = g
        .generate_batch(&StyleConfiguration::default(), &req)
        .unwrap();
    assert_eq!(out[1].sequence, i64::MAX);
}
