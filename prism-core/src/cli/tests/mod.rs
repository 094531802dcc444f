mod serve_tests;
