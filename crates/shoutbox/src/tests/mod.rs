mod shout_service_tests;
