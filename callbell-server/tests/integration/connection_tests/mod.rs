mod test_observer_sees_lifecycle;
