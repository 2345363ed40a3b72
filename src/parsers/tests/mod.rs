mod image_extractor_tests;
