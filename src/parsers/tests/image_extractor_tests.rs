use crate::parsers::ImageExtractor;

#[cfg(test)]
mod extraction_tests {
    use super::*;

    #[test]
    fn test_no_matches() {
        let extractor = ImageExtractor::default();
        assert!(extractor.extract("").is_empty());
        assert!(
            extractor
                .extract("<html><body><p>No wallpapers this month</p></body></html>")
                .is_empty()
        );
    }

    #[test]
    fn test_single_match() {
        let extractor = ImageExtractor::default();
        let body = "<a href='https://www.smashingmagazine.com/files/wallpapers/2021/01/foo-nocal-2560x1440.png'>";
        let images = extractor.extract(body);
        assert_eq!(images.len(), 1);
        assert!(images.contains(
            "https://www.smashingmagazine.com/files/wallpapers/2021/01/foo-nocal-2560x1440.png"
        ));
    }

    #[test]
    fn test_multiple_matches_mixed_tokens() {
        let extractor = ImageExtractor::default();
        let body = r#"
            <ul>
              <li><a href="https://www.smashingmagazine.com/files/wallpapers/jan-21/winter/nocal/winter-nocal-1920x1080.jpg">1920x1080</a></li>
              <li><a href="https://smashingmagazine.com/files/wallpapers/jan-21/winter/nocal/winter-nocal-3840x2160.JPEG">3840x2160</a></li>
              <li><a href="https://www.smashingmagazine.com/files/wallpapers/jan-21/snow_day/nocal/snow_day-nocal-2560x1440.png">2560x1440</a></li>
              <li><a href="https://www.smashingmagazine.com/files/wallpapers/jan-21/winter/nocal/winter-nocal-1920x1080.jpg">duplicate</a></li>
            </ul>
        "#;
        let images: Vec<String> = extractor.extract(body).into_iter().collect();
        assert_eq!(
            images,
            vec![
                "https://smashingmagazine.com/files/wallpapers/jan-21/winter/nocal/winter-nocal-3840x2160.JPEG",
                "https://www.smashingmagazine.com/files/wallpapers/jan-21/snow_day/nocal/snow_day-nocal-2560x1440.png",
                "https://www.smashingmagazine.com/files/wallpapers/jan-21/winter/nocal/winter-nocal-1920x1080.jpg",
            ]
        );
    }

    #[test]
    fn test_case_insensitive_host_and_path() {
        let extractor = ImageExtractor::default();
        let body = "HTTPS://WWW.SmashingMagazine.com/files/wallpapers/Oct-20/Autumn-nocal-1920x1080.PNG";
        assert_eq!(extractor.extract(body).len(), 1);
    }

    #[test]
    fn test_near_misses_do_not_match() {
        let extractor = ImageExtractor::default();

        // Wrong extension
        let gif = "https://www.smashingmagazine.com/files/wallpapers/2021/01/foo-nocal-2560x1440.gif";
        assert!(extractor.extract(gif).is_empty());

        // Calendar variant instead of nocal
        let cal = "https://www.smashingmagazine.com/files/wallpapers/2021/01/foo-cal-2560x1440.png";
        assert!(extractor.extract(cal).is_empty());

        // Resolution outside the accepted set
        let res = "https://www.smashingmagazine.com/files/wallpapers/2021/01/foo-nocal-1280x720.png";
        assert!(extractor.extract(res).is_empty());

        // Another host
        let host = "https://www.example.com/files/wallpapers/2021/01/foo-nocal-2560x1440.png";
        assert!(extractor.extract(host).is_empty());

        // Plain http
        let http = "http://www.smashingmagazine.com/files/wallpapers/2021/01/foo-nocal-2560x1440.png";
        assert!(extractor.extract(http).is_empty());

        // Outside the wallpapers directory
        let dir = "https://www.smashingmagazine.com/files/images/2021/01/foo-nocal-2560x1440.png";
        assert!(extractor.extract(dir).is_empty());
    }

    #[test]
    fn test_tolerates_broken_markup() {
        let extractor = ImageExtractor::default();
        let body = "<div <a href=\"https://www.smashingmagazine.com/files/wallpapers/may-19/bloom-nocal-1920x1080.jpg\" <<</span";
        let images = extractor.extract(body);
        assert_eq!(images.len(), 1);
        assert!(images.iter().all(|url| url.ends_with("bloom-nocal-1920x1080.jpg")));
    }

    #[test]
    fn test_extraction_is_pure() {
        let extractor = ImageExtractor::default();
        let body = "x https://www.smashingmagazine.com/files/wallpapers/a/b-nocal-1920x1080.jpg y \
                    https://www.smashingmagazine.com/files/wallpapers/a/c-nocal-2560x1440.png";
        assert_eq!(extractor.extract(body), extractor.extract(body));
    }
}
