mod variant_cache_tests;
